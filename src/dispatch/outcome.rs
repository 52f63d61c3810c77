use crate::error::ApiError;

/// Result of a dispatch operation that reached a decision. Refusals and
/// missing records are values here, not errors; only collaborator failures
/// travel as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Ok(T),
    Forbidden,
    NotFound,
    /// The write lost an optimistic concurrency race and the record still exists.
    Conflict,
    /// An add collided with an existing key supplied by the client.
    Duplicate,
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Forbidden => Outcome::Forbidden,
            Outcome::NotFound => Outcome::NotFound,
            Outcome::Conflict => Outcome::Conflict,
            Outcome::Duplicate => Outcome::Duplicate,
        }
    }

    /// Translate into the HTTP error contract. `subject` names the entity in messages.
    pub fn into_result(self, subject: &str) -> Result<T, ApiError> {
        match self {
            Outcome::Ok(value) => Ok(value),
            Outcome::Forbidden => Err(ApiError::forbidden(format!("Not authorized for this {}", subject))),
            Outcome::NotFound => Err(ApiError::not_found(format!("{} not found", subject))),
            Outcome::Conflict => {
                tracing::error!("{} changed during update and still exists", subject);
                Err(ApiError::internal_server_error(format!(
                    "{} was modified by another request",
                    subject
                )))
            }
            Outcome::Duplicate => Err(ApiError::field_error(
                "id",
                format!("A {} with this id already exists", subject),
            )),
        }
    }
}
