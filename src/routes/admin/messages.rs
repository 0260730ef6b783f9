use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;

use crate::databases::accounts::groupdb::{
    all_user_ids, group_exists, group_member_ids, list_groups, GroupRow,
};
use crate::databases::accounts::logindb::user_id_exists;
use crate::databases::messaging::messagedb::{admin_list, insert_admin_message, AdminMessageRow};
use crate::routes::admin::require_admin;

/// One entry of the group selector on the compose form.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct GroupChoice {
    pub value: String,
    pub label: String,
}

/// Blank choice, "All users", then one choice per existing group.
pub fn group_choices(groups: &[GroupRow]) -> Vec<GroupChoice> {
    let mut choices = vec![
        GroupChoice {
            value: String::new(),
            label: "---------".to_string(),
        },
        GroupChoice {
            value: "all".to_string(),
            label: "All users".to_string(),
        },
    ];
    choices.extend(groups.iter().map(|group| GroupChoice {
        value: group.id.to_string(),
        label: group.name.clone(),
    }));
    choices
}

/// The group selector as submitted: blank, "all", or a group id.
#[derive(Debug, PartialEq, Eq)]
pub enum GroupTarget {
    NoneSelected,
    All,
    Group(i32),
}

pub fn parse_group_field(raw: Option<&str>) -> Option<GroupTarget> {
    match raw.map(str::trim).unwrap_or("") {
        "" => Some(GroupTarget::NoneSelected),
        "all" => Some(GroupTarget::All),
        value => value.parse::<i32>().ok().map(GroupTarget::Group),
    }
}

/// Fan-out targets: every candidate except the recipient already used.
pub fn fan_out_recipients(candidates: Vec<i32>, original_recipient: i32) -> Vec<i32> {
    candidates
        .into_iter()
        .filter(|id| *id != original_recipient)
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct AdminComposeRequest {
    pub sender: i32,
    pub recipient: Option<i32>,
    pub group: Option<String>,
    pub parent_msg: Option<i32>,
    pub subject: String,
    pub body: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub replied_at: Option<DateTime<Utc>>,
    pub sender_deleted_at: Option<DateTime<Utc>>,
    pub recipient_deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ChangelistQuery {
    pub search: Option<String>,
}

fn field_error(field: &str, message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "errors": { field: message } }))
}

#[get("/api/admin/messages/new")]
async fn compose_form(req: HttpRequest, db_pool: web::Data<PgPool>) -> impl Responder {
    if let Err(resp) = require_admin(&req, &db_pool).await {
        return resp;
    }

    match list_groups(&db_pool).await {
        Ok(groups) => HttpResponse::Ok().json(json!({ "group_choices": group_choices(&groups) })),
        Err(e) => {
            log::error!("Error fetching groups: {:?}", e);
            HttpResponse::InternalServerError().body("Failed to fetch groups")
        }
    }
}

#[get("/api/admin/messages")]
async fn changelist(
    req: HttpRequest,
    query: web::Query<ChangelistQuery>,
    db_pool: web::Data<PgPool>,
) -> impl Responder {
    if let Err(resp) = require_admin(&req, &db_pool).await {
        return resp;
    }

    match admin_list(&db_pool, query.search.as_deref()).await {
        Ok(messages) => HttpResponse::Ok().json(messages),
        Err(e) => {
            log::error!("Error fetching messages: {:?}", e);
            HttpResponse::InternalServerError().body("Failed to fetch messages")
        }
    }
}

#[post("/api/admin/messages")]
async fn create(
    req: HttpRequest,
    payload: web::Json<AdminComposeRequest>,
    db_pool: web::Data<PgPool>,
) -> impl Responder {
    if let Err(resp) = require_admin(&req, &db_pool).await {
        return resp;
    }
    let form = payload.into_inner();

    // The column is nullable; the admin form still requires a recipient.
    let recipient = match form.recipient {
        Some(recipient) => recipient,
        None => return field_error("recipient", "This field is required."),
    };
    if form.subject.is_empty() {
        return field_error("subject", "This field is required.");
    }
    if form.body.is_empty() {
        return field_error("body", "This field is required.");
    }

    match user_id_exists(&db_pool, form.sender).await {
        Ok(false) => return field_error("sender", "Select a valid choice."),
        Err(e) => {
            log::error!("Sender lookup failed: {:?}", e);
            return HttpResponse::InternalServerError().body("Database error");
        }
        _ => {}
    }
    match user_id_exists(&db_pool, recipient).await {
        Ok(false) => return field_error("recipient", "Select a valid choice."),
        Err(e) => {
            log::error!("Recipient lookup failed: {:?}", e);
            return HttpResponse::InternalServerError().body("Database error");
        }
        _ => {}
    }

    let target = match parse_group_field(form.group.as_deref()) {
        Some(target) => target,
        None => return field_error("group", "Select a valid choice."),
    };
    if let GroupTarget::Group(group_id) = target {
        match group_exists(&db_pool, group_id).await {
            Ok(false) => return field_error("group", "Select a valid choice."),
            Err(e) => {
                log::error!("Group lookup failed: {:?}", e);
                return HttpResponse::InternalServerError().body("Database error");
            }
            _ => {}
        }
    }

    let row = AdminMessageRow {
        sender_id: form.sender,
        parent_msg_id: form.parent_msg,
        subject: &form.subject,
        body: &form.body,
        sent_at: form.sent_at,
        read_at: form.read_at,
        replied_at: form.replied_at,
        sender_deleted_at: form.sender_deleted_at,
        recipient_deleted_at: form.recipient_deleted_at,
    };

    let message_id = match insert_admin_message(&db_pool, &row, recipient).await {
        Ok(id) => id,
        Err(e) => {
            log::error!("Insert message error: {:?}", e);
            return HttpResponse::InternalServerError().body("Failed to insert message");
        }
    };

    let candidates = match target {
        GroupTarget::NoneSelected => Vec::new(),
        GroupTarget::All => match all_user_ids(&db_pool).await {
            Ok(ids) => ids,
            Err(e) => {
                log::error!("Error fetching users for fan-out: {:?}", e);
                return HttpResponse::InternalServerError().body("Failed to fetch users");
            }
        },
        GroupTarget::Group(group_id) => match group_member_ids(&db_pool, group_id).await {
            Ok(ids) => ids,
            Err(e) => {
                log::error!("Error fetching group members for fan-out: {:?}", e);
                return HttpResponse::InternalServerError().body("Failed to fetch group members");
            }
        },
    };

    // One independent autocommitted insert per target. No transaction: a
    // failure mid-loop leaves the clones already written in place.
    let targets = fan_out_recipients(candidates, recipient);
    for &clone_recipient in &targets {
        if let Err(e) = insert_admin_message(&db_pool, &row, clone_recipient).await {
            log::error!(
                "Fan-out insert failed for recipient {}: {:?}",
                clone_recipient,
                e
            );
            return HttpResponse::InternalServerError().body("Failed during fan-out");
        }
    }

    HttpResponse::Created().json(json!({
        "message_id": message_id,
        "fan_out": targets.len()
    }))
}

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(compose_form);
    cfg.service(changelist);
    cfg.service(create);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<GroupRow> {
        vec![
            GroupRow {
                id: 7,
                name: "editors".to_string(),
            },
            GroupRow {
                id: 9,
                name: "moderators".to_string(),
            },
        ]
    }

    #[test]
    fn choices_start_with_blank_and_all_users() {
        let choices = group_choices(&groups());
        assert_eq!(choices[0].value, "");
        assert_eq!(choices[0].label, "---------");
        assert_eq!(choices[1].value, "all");
        assert_eq!(choices[1].label, "All users");
        assert_eq!(choices[2].value, "7");
        assert_eq!(choices[2].label, "editors");
        assert_eq!(choices[3].value, "9");
        assert_eq!(choices[3].label, "moderators");
        assert_eq!(choices.len(), 4);
    }

    #[test]
    fn group_field_parses_blank_all_and_ids() {
        assert_eq!(parse_group_field(None), Some(GroupTarget::NoneSelected));
        assert_eq!(parse_group_field(Some("")), Some(GroupTarget::NoneSelected));
        assert_eq!(parse_group_field(Some("all")), Some(GroupTarget::All));
        assert_eq!(parse_group_field(Some("42")), Some(GroupTarget::Group(42)));
        assert_eq!(parse_group_field(Some("editors")), None);
    }

    #[test]
    fn fan_out_excludes_the_original_recipient() {
        assert_eq!(fan_out_recipients(vec![1, 2, 3, 4], 3), vec![1, 2, 4]);
        assert_eq!(fan_out_recipients(vec![3], 3), Vec::<i32>::new());
        assert_eq!(fan_out_recipients(Vec::new(), 3), Vec::<i32>::new());
    }
}
