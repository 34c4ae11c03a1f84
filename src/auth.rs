//! ログイン認証
//!
//! 設定（または環境変数 ADMIN_PASSWORD / USER_PASSWORD）にパスワードがあれば、
//! API呼び出しの前にユーザー名とパスワードを確認する。

use crate::config::AuthConfig;
use crate::error::{FortuneAiError, Result};
use dialoguer::{Input, Password};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

/// 空でないパスワードが1つでも設定されていれば認証が必要
pub fn is_required(auth: &AuthConfig) -> bool {
    configured(&auth.admin_password).is_some() || configured(&auth.user_password).is_some()
}

/// 照合のみ（空の設定パスワードは一致扱いにしない）
pub fn check(auth: &AuthConfig, username: &str, password: &str) -> Option<Role> {
    let username = username.trim();
    if username == auth.admin_username && configured(&auth.admin_password) == Some(password) {
        return Some(Role::Admin);
    }
    if username == auth.user_username && configured(&auth.user_password) == Some(password) {
        return Some(Role::User);
    }
    None
}

/// 認証ゲート
///
/// 認証不要なら `Ok(None)`。足りない入力は対話で尋ねる
pub fn authenticate(
    auth: &AuthConfig,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<Option<Role>> {
    if !is_required(auth) {
        return Ok(None);
    }

    let username = match username {
        Some(name) => name.to_string(),
        None => Input::<String>::new()
            .with_prompt("ユーザー名")
            .interact_text()
            .map_err(|e| FortuneAiError::Input(e.to_string()))?,
    };
    let password = match password {
        Some(pass) => pass.to_string(),
        None => Password::new()
            .with_prompt("パスワード")
            .interact()
            .map_err(|e| FortuneAiError::Input(e.to_string()))?,
    };

    match check(auth, &username, &password) {
        Some(role) => {
            tracing::info!(?role, user = %username, "ログイン成功");
            Ok(Some(role))
        }
        None => Err(FortuneAiError::AuthFailed),
    }
}

fn configured(password: &Option<String>) -> Option<&str> {
    password.as_deref().filter(|p| !p.is_empty())
}
