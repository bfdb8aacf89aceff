//! Resolve the caller forwarded by the identity provider.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::user::{Role, User, UserRepository};
use crate::{AppState, ServerError};

/// Identified user with its role.
#[derive(Clone, Debug)]
pub struct Account {
    pub user: User,
    pub role: Role,
}

/// Caller of the current request.
#[derive(Clone, Debug, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    Identified(Account),
}

impl Viewer {
    /// Account of the caller, or [`ServerError::Unauthorized`].
    pub fn require(&self) -> Result<&Account, ServerError> {
        match self {
            Viewer::Identified(account) => Ok(account),
            Viewer::Anonymous => Err(ServerError::Unauthorized),
        }
    }

    /// Id of the caller when identified.
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Viewer::Identified(account) => Some(account.user.id),
            Viewer::Anonymous => None,
        }
    }
}

/// Middleware attaching a [`Viewer`] to every request.
///
/// A header that does not name a known user is rejected rather than
/// downgraded to an anonymous caller.
pub async fn identify(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let header = state.config.identity.header_name();
    let viewer = match req.headers().get(&header) {
        Some(value) => {
            let user_id = value
                .to_str()
                .ok()
                .and_then(|id| id.trim().parse::<i64>().ok())
                .ok_or(ServerError::Unauthorized)?;

            let (user, role) = UserRepository::new(state.db.pool.clone())
                .find_account(user_id)
                .await?
                .ok_or(ServerError::Unauthorized)?;

            tracing::debug!(user_id, ?role, "request identified");
            Viewer::Identified(Account { user, role })
        },
        None => Viewer::Anonymous,
    };

    req.extensions_mut().insert(viewer);
    Ok(next.run(req).await)
}
