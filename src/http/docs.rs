//! Interactive API documentation (local profile only).

use axum::{response::Html, Json};
use serde_json::{json, Value};

use crate::portfolio::ACCOUNT_ID_MAX_LEN;

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Portfolio Gateway - API docs</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({ url: "/openapi.json", dom_id: "#swagger-ui" });
  </script>
</body>
</html>
"##;

pub async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI)
}

pub async fn openapi_json() -> Json<Value> {
    Json(openapi_document())
}

pub fn openapi_document() -> Value {
    let error = json!({ "$ref": "#/components/schemas/Error" });
    let bool_param = |name: &str, description: &str| {
        json!({
            "name": name,
            "in": "query",
            "required": false,
            "description": description,
            "schema": { "type": "boolean", "default": true }
        })
    };

    json!({
        "openapi": "3.1.0",
        "info": {
            "title": "Portfolio Gateway",
            "version": env!("CARGO_PKG_VERSION")
        },
        "paths": {
            "/": {
                "get": {
                    "summary": "Service status",
                    "responses": { "200": { "description": "Running" } }
                }
            },
            "/api/v1/health": {
                "get": {
                    "summary": "Liveness probe",
                    "responses": {
                        "200": {
                            "description": "Healthy",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/HealthCheckResponse" } } }
                        }
                    }
                }
            },
            "/api/v1/portfolio": {
                "get": {
                    "summary": "Portfolio details from the brokerage",
                    "security": [ { "bearerAuth": [] } ],
                    "parameters": [
                        {
                            "name": "account_id",
                            "in": "query",
                            "required": false,
                            "description": "Specific account ID to fetch portfolio for",
                            "schema": { "type": "string", "pattern": "^[A-Za-z0-9_-]*$", "maxLength": ACCOUNT_ID_MAX_LEN }
                        },
                        bool_param("include_positions", "Whether to include position details"),
                        bool_param("include_summary", "Whether to include account summary")
                    ],
                    "responses": {
                        "200": {
                            "description": "Portfolio",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Portfolio" } } }
                        },
                        "401": { "description": "Invalid API key", "content": { "application/json": { "schema": error } } },
                        "403": { "description": "Missing credentials", "content": { "application/json": { "schema": error } } },
                        "422": { "description": "Validation failure", "content": { "application/json": { "schema": error } } },
                        "500": { "description": "Upstream failure", "content": { "application/json": { "schema": error } } }
                    }
                }
            }
        },
        "components": {
            "securitySchemes": {
                "bearerAuth": { "type": "http", "scheme": "bearer" }
            },
            "schemas": {
                "Error": {
                    "type": "object",
                    "required": ["detail"],
                    "properties": { "detail": { "type": "string" } }
                },
                "HealthCheckResponse": {
                    "type": "object",
                    "required": ["status", "version", "timestamp"],
                    "properties": {
                        "status": { "type": "string" },
                        "version": { "type": "string" },
                        "timestamp": { "type": "string", "format": "date-time" }
                    }
                },
                "Portfolio": {
                    "type": "object",
                    "required": ["account_id"],
                    "properties": {
                        "account_id": { "type": "string" },
                        "positions": { "type": "array", "items": { "type": "object" } },
                        "summary": { "type": "object" }
                    }
                }
            }
        }
    })
}
