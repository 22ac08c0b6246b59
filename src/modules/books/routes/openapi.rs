use serde_json::{json, Value};

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn json_body(schema: &str) -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{}", schema) }
            }
        }
    })
}

fn id_parameter() -> Value {
    json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "description": "Book identifier",
        "schema": { "type": "integer", "format": "int64", "minimum": 1 }
    }])
}

/// OpenAPI fragment for the Books module; paths are relative to the mount point.
pub fn openapi() -> Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "List of books",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "503": error_response("Book storage unavailable")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": json_body("CreateBook"),
                    "responses": {
                        "200": book_response("Book created"),
                        "400": error_response("Invalid request data"),
                        "409": error_response("A book with the same title and author already exists"),
                        "503": error_response("Book storage unavailable")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book by id",
                    "tags": ["Books"],
                    "parameters": id_parameter(),
                    "responses": {
                        "200": book_response("Book found"),
                        "400": error_response("Invalid book id"),
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Update a book",
                    "description": "Only fields present in the body are changed.",
                    "tags": ["Books"],
                    "parameters": id_parameter(),
                    "requestBody": json_body("UpdateBook"),
                    "responses": {
                        "200": book_response("Book updated"),
                        "400": error_response("Invalid request data"),
                        "404": error_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": id_parameter(),
                    "responses": {
                        "204": { "description": "Book deleted" },
                        "400": error_response("Invalid book id"),
                        "404": error_response("Book not found")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": {
                                "text/plain": { "schema": { "type": "string" } }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": "string" },
                        "publishedDate": { "type": ["string", "null"], "format": "date" },
                        "price": { "type": ["number", "null"], "description": "Decimal amount, written with the scale it was stored with" }
                    },
                    "required": ["id", "title", "author", "isbn", "publishedDate", "price"]
                },
                "CreateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1 },
                        "author": { "type": "string", "minLength": 1 },
                        "isbn": { "type": "string" },
                        "publishedDate": { "type": "string", "format": "date" },
                        "price": { "type": "number" }
                    },
                    "required": ["title", "author", "isbn"]
                },
                "UpdateBook": {
                    "type": "object",
                    "description": "Missing keys leave the stored value unchanged; null clears publishedDate or price.",
                    "properties": {
                        "title": { "type": "string", "minLength": 1 },
                        "author": { "type": "string", "minLength": 1 },
                        "isbn": { "type": "string" },
                        "publishedDate": { "type": ["string", "null"], "format": "date" },
                        "price": { "type": ["number", "null"] }
                    }
                }
            }
        }
    })
}
