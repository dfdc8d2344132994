//! In-process stand-in for the identity authority.

use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::json;
use shortlink_sso::AuthApi;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::time::Duration;
use time::OffsetDateTime;
use tonic::Status;

/// Sign a credential the way the identity authority does.
#[allow(dead_code)]
pub fn mint_token(secret: &str, uid: i64, ttl_secs: i64) -> String {
    let claims = json!({
        "uid": uid,
        "email": format!("user{uid}@example.com"),
        "app_id": 1,
        "exp": OffsetDateTime::now_utc().unix_timestamp() + ttl_secs,
    });
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign token")
}

/// Stub `AuthApi` keeping accounts in memory and counting calls.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct StubAuthApi {
    secret: String,
    users: Mutex<HashMap<String, (i64, String)>>,
    admins: Mutex<HashSet<i64>>,
    next_id: AtomicI64,
    failure: Mutex<Option<Status>>,
    delay: Mutex<Option<Duration>>,
    pub is_admin_calls: AtomicU32,
    pub register_calls: AtomicU32,
    pub login_calls: AtomicU32,
    pub last_app_id: Mutex<Option<i32>>,
}

#[allow(dead_code)]
impl StubAuthApi {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
            users: Mutex::new(HashMap::new()),
            admins: Mutex::new(HashSet::new()),
            next_id: AtomicI64::new(1),
            failure: Mutex::new(None),
            delay: Mutex::new(None),
            is_admin_calls: AtomicU32::new(0),
            register_calls: AtomicU32::new(0),
            login_calls: AtomicU32::new(0),
            last_app_id: Mutex::new(None),
        }
    }

    pub fn grant_admin(&self, uid: i64) {
        self.admins.lock().unwrap().insert(uid);
    }

    /// Make every subsequent call fail with `status`.
    pub fn fail_with(&self, status: Status) {
        *self.failure.lock().unwrap() = Some(status);
    }

    /// Make every subsequent call take `delay` before answering.
    pub fn delay_by(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn is_admin_count(&self) -> u32 {
        self.is_admin_calls.load(Ordering::SeqCst)
    }

    async fn gate(&self) -> Result<(), Status> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failure.lock().unwrap().clone() {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AuthApi for StubAuthApi {
    async fn is_admin(&self, user_id: i64) -> Result<bool, Status> {
        self.is_admin_calls.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        Ok(self.admins.lock().unwrap().contains(&user_id))
    }

    async fn register(&self, email: &str, password: &str) -> Result<i64, Status> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            return Err(Status::already_exists("user already exists"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        users.insert(email.to_string(), (id, password.to_string()));
        Ok(id)
    }

    async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String, Status> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_app_id.lock().unwrap() = Some(app_id);
        self.gate().await?;
        let uid = match self.users.lock().unwrap().get(email) {
            Some((id, stored)) if stored == password => *id,
            _ => return Err(Status::invalid_argument("invalid email or password")),
        };
        Ok(mint_token(&self.secret, uid, 3600))
    }
}
