pub mod network {
    pub const DEFAULT_BASE_URL: &str = "https://apigateway.grupo1.inf326.nursoft.dev";
    pub const USER_AGENT: &str = "chatgw/0.1";
    pub const HEADER_USER_ID: &str = "x-user-id";
    pub const CONTENT_TYPE_JSON: &str = "application/json";
}

pub mod env {
    pub const BASE_URL: &str = "CHATGW_API_BASE_URL";
    pub const SESSION_PATH: &str = "CHATGW_SESSION_PATH";
    pub const LOG_LEVEL: &str = "CHATGW_LOG_LEVEL";
    pub const LOG_LEVEL_FALLBACK: &str = "LOG_LEVEL";
}

pub mod session {
    pub const TOKEN_KEY: &str = "token";
    pub const USER_KEY: &str = "user";
    pub const STATE_DIR: &str = "chatgw";
    pub const FILE_NAME: &str = "session.json";
    pub const FILE_MODE: u32 = 0o600;
}

pub mod pagination {
    pub const MESSAGES_LIMIT: u32 = 50;
    pub const BLACKLIST_LIMIT: u32 = 50;
}

pub mod presence {
    pub const USER_POLL_INTERVAL_MS: u64 = 30_000;
    pub const STATS_POLL_INTERVAL_MS: u64 = 60_000;
    pub const OFFLINE: &str = "offline";
    pub const ONLINE: &str = "online";
    pub const DEVICE: &str = "web";
}

pub mod chatbots {
    pub const WIKIPEDIA_DEFAULT_LANGUAGE: &str = "es";
    pub const WIKIPEDIA_HEALTH: &str = "/chatbots/wikipedia/health";
    pub const PROGRAMMING_HEALTH: &str = "/chatbots/programming/health";
}
