use std::time::Duration;

/// Process configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub roles: RoleConfig,
    /// Upper bound for any single platform side effect.
    pub side_effect_timeout: Duration,
}

/// Platform role ids the core makes decisions on.
#[derive(Debug, Clone, Default)]
pub struct RoleConfig {
    pub league_host: String,
    pub staff: String,
    /// Strike roles for counts 1, 2 and 3.
    pub strikes: [String; 3],
}

impl RoleConfig {
    pub fn strike_role(&self, count: u32) -> Option<&str> {
        match count {
            1..=3 => Some(self.strikes[count as usize - 1].as_str()),
            _ => None,
        }
    }

    pub fn is_strike_role(&self, role: &str) -> bool {
        !role.is_empty() && self.strikes.iter().any(|r| r == role)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

impl Config {
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3001);
        let timeout_ms: u64 = std::env::var("SIDE_EFFECT_TIMEOUT_MS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(5000);

        Config {
            host: env_or("HOST", "0.0.0.0"),
            port,
            database_path: env_or("DATABASE_PATH", "league-hub.db"),
            roles: RoleConfig {
                league_host: env_or("LEAGUE_HOST_ROLE_ID", ""),
                staff: env_or("STAFF_ROLE_ID", ""),
                strikes: [
                    env_or("HOST_STRIKE_1_ROLE_ID", ""),
                    env_or("HOST_STRIKE_2_ROLE_ID", ""),
                    env_or("HOST_STRIKE_3_ROLE_ID", ""),
                ],
            },
            side_effect_timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            host: "127.0.0.1".into(),
            port: 0,
            database_path: ":memory:".into(),
            roles: RoleConfig {
                league_host: "role-host".into(),
                staff: "role-staff".into(),
                strikes: ["role-strike-1".into(), "role-strike-2".into(), "role-strike-3".into()],
            },
            side_effect_timeout: Duration::from_millis(500),
        }
    }
}
