use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::databases::accounts::logindb::user_id_exists;
use crate::databases::messaging::messagedb::{
    create_message, fetch_for_participant, inbox, mark_read, mark_replied, outbox, set_deleted,
    trash,
};
use crate::routes::require_user;

#[derive(Debug, Deserialize)]
pub struct ComposeRequest {
    pub recipient: Option<i32>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub body: String,
}

pub fn format_reply_subject(subject: &str) -> String {
    format!("Re: {}", subject)
}

fn field_error(field: &str, message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "errors": { field: message } }))
}

#[get("/api/messages/inbox")]
async fn inbox_view(req: HttpRequest, db_pool: web::Data<PgPool>) -> impl Responder {
    let user = match require_user(&req, &db_pool).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match inbox(&db_pool, user.id).await {
        Ok(messages) => HttpResponse::Ok().json(messages),
        Err(e) => {
            log::error!("Error fetching inbox: {:?}", e);
            HttpResponse::InternalServerError().body("Failed to fetch inbox")
        }
    }
}

#[get("/api/messages/outbox")]
async fn outbox_view(req: HttpRequest, db_pool: web::Data<PgPool>) -> impl Responder {
    let user = match require_user(&req, &db_pool).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match outbox(&db_pool, user.id).await {
        Ok(messages) => HttpResponse::Ok().json(messages),
        Err(e) => {
            log::error!("Error fetching outbox: {:?}", e);
            HttpResponse::InternalServerError().body("Failed to fetch outbox")
        }
    }
}

#[get("/api/messages/trash")]
async fn trash_view(req: HttpRequest, db_pool: web::Data<PgPool>) -> impl Responder {
    let user = match require_user(&req, &db_pool).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match trash(&db_pool, user.id).await {
        Ok(messages) => HttpResponse::Ok().json(messages),
        Err(e) => {
            log::error!("Error fetching trash: {:?}", e);
            HttpResponse::InternalServerError().body("Failed to fetch trash")
        }
    }
}

#[post("/api/messages")]
async fn compose(
    req: HttpRequest,
    payload: web::Json<ComposeRequest>,
    db_pool: web::Data<PgPool>,
) -> impl Responder {
    let user = match require_user(&req, &db_pool).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let message = payload.into_inner();

    let recipient = match message.recipient {
        Some(recipient) => recipient,
        None => return field_error("recipient", "This field is required."),
    };
    if message.subject.is_empty() {
        return field_error("subject", "This field is required.");
    }
    if message.body.is_empty() {
        return field_error("body", "This field is required.");
    }

    match user_id_exists(&db_pool, recipient).await {
        Ok(false) => return field_error("recipient", "Select a valid choice."),
        Err(e) => {
            log::error!("Recipient lookup failed: {:?}", e);
            return HttpResponse::InternalServerError().body("Database error");
        }
        _ => {}
    }

    match create_message(&db_pool, user.id, recipient, None, &message.subject, &message.body).await
    {
        Ok(saved) => HttpResponse::Created().json(saved),
        Err(e) => {
            log::error!("Insert message error: {:?}", e);
            HttpResponse::InternalServerError().body("Failed to insert message")
        }
    }
}

#[get("/api/messages/{id}")]
async fn view_message(
    req: HttpRequest,
    path: web::Path<i32>,
    db_pool: web::Data<PgPool>,
) -> impl Responder {
    let user = match require_user(&req, &db_pool).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let message_id = path.into_inner();

    let message = match fetch_for_participant(&db_pool, message_id, user.id).await {
        Ok(Some(message)) => message,
        Ok(None) => return HttpResponse::NotFound().body("Message not found"),
        Err(e) => {
            log::error!("Error fetching message: {:?}", e);
            return HttpResponse::InternalServerError().body("Failed to fetch message");
        }
    };

    // First view by the recipient stamps read_at.
    if message.recipient_id == Some(user.id) && message.read_at.is_none() {
        match mark_read(&db_pool, message.id).await {
            Ok(updated) => return HttpResponse::Ok().json(updated),
            Err(e) => {
                log::error!("Error marking message read: {:?}", e);
                return HttpResponse::InternalServerError().body("Failed to update message");
            }
        }
    }

    HttpResponse::Ok().json(message)
}

#[post("/api/messages/{id}/reply")]
async fn reply(
    req: HttpRequest,
    path: web::Path<i32>,
    payload: web::Json<ReplyRequest>,
    db_pool: web::Data<PgPool>,
) -> impl Responder {
    let user = match require_user(&req, &db_pool).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let message_id = path.into_inner();
    let reply_body = payload.into_inner().body;

    if reply_body.is_empty() {
        return field_error("body", "This field is required.");
    }

    let original = match fetch_for_participant(&db_pool, message_id, user.id).await {
        Ok(Some(message)) if message.recipient_id == Some(user.id) => message,
        Ok(_) => return HttpResponse::NotFound().body("Message not found"),
        Err(e) => {
            log::error!("Error fetching message: {:?}", e);
            return HttpResponse::InternalServerError().body("Failed to fetch message");
        }
    };

    let subject = format_reply_subject(&original.subject);
    let saved = match create_message(
        &db_pool,
        user.id,
        original.sender_id,
        Some(original.id),
        &subject,
        &reply_body,
    )
    .await
    {
        Ok(saved) => saved,
        Err(e) => {
            log::error!("Insert reply error: {:?}", e);
            return HttpResponse::InternalServerError().body("Failed to insert reply");
        }
    };

    if let Err(e) = mark_replied(&db_pool, original.id).await {
        log::error!("Error marking message replied: {:?}", e);
        return HttpResponse::InternalServerError().body("Failed to update message");
    }

    HttpResponse::Created().json(saved)
}

async fn set_deleted_for_caller(
    req: &HttpRequest,
    message_id: i32,
    deleted: bool,
    db_pool: &PgPool,
) -> HttpResponse {
    let user = match require_user(req, db_pool).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let message = match fetch_for_participant(db_pool, message_id, user.id).await {
        Ok(Some(message)) => message,
        Ok(None) => return HttpResponse::NotFound().body("Message not found"),
        Err(e) => {
            log::error!("Error fetching message: {:?}", e);
            return HttpResponse::InternalServerError().body("Failed to fetch message");
        }
    };

    let as_sender = message.sender_id == user.id;
    let as_recipient = message.recipient_id == Some(user.id);

    match set_deleted(db_pool, message.id, as_sender, as_recipient, deleted).await {
        Ok(updated) => HttpResponse::Ok().json(updated),
        Err(e) => {
            log::error!("Error updating deletion stamps: {:?}", e);
            HttpResponse::InternalServerError().body("Failed to update message")
        }
    }
}

#[post("/api/messages/{id}/delete")]
async fn delete_message(
    req: HttpRequest,
    path: web::Path<i32>,
    db_pool: web::Data<PgPool>,
) -> impl Responder {
    set_deleted_for_caller(&req, path.into_inner(), true, &db_pool).await
}

#[post("/api/messages/{id}/undelete")]
async fn undelete_message(
    req: HttpRequest,
    path: web::Path<i32>,
    db_pool: web::Data<PgPool>,
) -> impl Responder {
    set_deleted_for_caller(&req, path.into_inner(), false, &db_pool).await
}

pub fn init(cfg: &mut web::ServiceConfig) {
    // Literal paths first so they are never shadowed by /{id}.
    cfg.service(inbox_view);
    cfg.service(outbox_view);
    cfg.service(trash_view);
    cfg.service(compose);
    cfg.service(view_message);
    cfg.service(reply);
    cfg.service(delete_message);
    cfg.service(undelete_message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_subject_is_prefixed_per_hop() {
        assert_eq!(format_reply_subject("hello"), "Re: hello");
        assert_eq!(format_reply_subject("Re: hello"), "Re: Re: hello");
    }
}
