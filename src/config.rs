use std::env;
use chrono_tz::Tz;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret_key: String, // Private key (PEM)
    pub jwt_public_key: String, // Public key (PEM)
    pub auth_issuer: String,
    pub timezone: Tz,
    pub default_group_capacity: i32,
    pub slot_cache_ttl_secs: u64,
    pub completion_sweep_secs: u64,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set (Ed25519 Private Key)"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.coaching.local".to_string()),
            timezone: env::var("GYM_TIMEZONE")
                .unwrap_or_else(|_| "Europe/Paris".to_string())
                .parse()
                .expect("GYM_TIMEZONE must be an IANA timezone name"),
            default_group_capacity: env::var("DEFAULT_GROUP_CAPACITY").unwrap_or_else(|_| "8".to_string()).parse().expect("DEFAULT_GROUP_CAPACITY must be a number"),
            slot_cache_ttl_secs: env::var("SLOT_CACHE_TTL_SECS").unwrap_or_else(|_| "60".to_string()).parse().expect("SLOT_CACHE_TTL_SECS must be a number"),
            completion_sweep_secs: env::var("COMPLETION_SWEEP_SECS").unwrap_or_else(|_| "300".to_string()).parse().expect("COMPLETION_SWEEP_SECS must be a number"),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }
}
