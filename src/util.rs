use std::net::SocketAddr;
use std::path::PathBuf;

const SCHEDULE_DB_PATH: &str = "SCHEDULE_DB_PATH";

pub fn get_db_path() -> Option<PathBuf> {
    std::env::var(SCHEDULE_DB_PATH)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
}

const SCHEDULE_API_ADDR: &str = "SCHEDULE_API_ADDR";

pub fn get_api_addr() -> Option<SocketAddr> {
    let addr_from_env = std::env::var(SCHEDULE_API_ADDR);
    addr_from_env.ok().and_then(|res| res.parse().ok())
}
