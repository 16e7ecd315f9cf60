//! 认证中间件
//!
//! 为 JWT 认证和授权提供 Axum 中间件

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::models::{Action, Resource};

use crate::auth::{JwtError, JwtService, Principal};
use crate::core::ServerState;
use crate::rbac::AuthzError;
use crate::security_log;
use crate::utils::AppError;

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT。
/// 验证成功后将 [`Principal`] 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - `/api/health`
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 NotAuthenticated |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 TokenInvalid |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if path == "/api/health" {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::not_authenticated());
        }
    };

    let principal = principal_from_token(state.get_jwt_service(), token, req.uri())?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Validate a bearer token into a [`Principal`]
pub(crate) fn principal_from_token(
    jwt_service: &JwtService,
    token: &str,
    uri: &http::Uri,
) -> Result<Principal, AppError> {
    let claims = jwt_service.validate_token(token).map_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = format!("{}", e),
            uri = format!("{:?}", uri)
        );
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    Principal::try_from(claims)
        .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {}", e)))
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// 权限检查中间件 - 要求对某资源执行某动作的权限
///
/// 检查前先用用户存储中的当前身份覆盖令牌中的缓存值；通过后把
/// 生效的权限矩阵挂到 [`Principal`] 上，供后续处理函数读取。
///
/// # 用法
///
/// ```ignore
/// use axum::middleware;
/// Router::new()
///     .route("/api/roles", get(handler::list))
///     .layer(middleware::from_fn_with_state(
///         state.clone(),
///         require_permission(Resource::Admin, Action::View),
///     ));
/// ```
///
/// # 错误
///
/// 无权限返回 403 PermissionDenied，存储读取失败返回 500 (拒绝)
pub fn require_permission(
    resource: Resource,
    action: Action,
) -> impl Fn(State<ServerState>, Request, Next) -> MiddlewareFuture + Clone {
    move |State(state): State<ServerState>, mut req: Request, next: Next| {
        Box::pin(async move {
            let mut principal = req.extensions_mut().remove::<Principal>();

            if let Err(e) = state
                .authorizer()
                .check_permission(principal.as_mut(), resource, action)
                .await
            {
                log_denial(principal.as_ref(), &e);
                return Err(e.into());
            }

            if let Some(principal) = principal {
                req.extensions_mut().insert(principal);
            }
            Ok(next.run(req).await)
        })
    }
}

/// 管理员中间件 - 要求当前身份为管理员
///
/// # 错误
///
/// 非管理员返回 403 AdminRequired
pub async fn require_admin(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let mut principal = req.extensions_mut().remove::<Principal>();

    if let Err(e) = state.authorizer().require_admin(principal.as_mut()).await {
        log_denial(principal.as_ref(), &e);
        return Err(e.into());
    }

    if let Some(principal) = principal {
        req.extensions_mut().insert(principal);
    }
    Ok(next.run(req).await)
}

fn log_denial(principal: Option<&Principal>, error: &AuthzError) {
    let user_id = principal.map(|p| p.id).unwrap_or_default();
    match error {
        AuthzError::Internal(_) => {
            tracing::error!(user_id, error = %error, "Authorization check failed");
        }
        _ => {
            security_log!(
                "WARN",
                "permission_denied",
                user_id = user_id,
                reason = format!("{}", error)
            );
        }
    }
}

/// 从请求中提取 Principal 的扩展方法
pub trait PrincipalExt {
    /// 从请求扩展中获取 Principal
    ///
    /// # 错误
    ///
    /// 未认证返回 401
    fn principal(&self) -> Result<&Principal, AppError>;
}

impl PrincipalExt for Request {
    fn principal(&self) -> Result<&Principal, AppError> {
        self.extensions()
            .get::<Principal>()
            .ok_or_else(AppError::not_authenticated)
    }
}
