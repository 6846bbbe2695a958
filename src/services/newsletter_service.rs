use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::newsletter::SubscribeRequest,
    entity::{
        NewsletterSubscribers,
        newsletter_subscribers::{ActiveModel, Column, Model as SubscriberModel},
    },
    error::{AppError, AppResult},
    models::Subscriber,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn subscribe(
    state: &AppState,
    payload: SubscribeRequest,
) -> AppResult<ApiResponse<Subscriber>> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    // App-level check; the unique index backstops the race.
    let exists = NewsletterSubscribers::find()
        .filter(Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict("Email already subscribed".to_string()));
    }

    let subscriber = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "newsletter_subscribe",
        Some("newsletter_subscribers"),
        Some(serde_json::json!({ "subscriber_id": subscriber.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Successfully subscribed to newsletter",
        subscriber_from_entity(subscriber),
        Some(Meta::empty()),
    ))
}

fn subscriber_from_entity(model: SubscriberModel) -> Subscriber {
    Subscriber {
        id: model.id,
        email: model.email,
        created_at: model.created_at.with_timezone(&chrono::Utc),
    }
}
