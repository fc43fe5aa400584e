use anyhow::{Context, Result};

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub loan: LoanConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // 環境変数の読み出し元を差し替えられるようにしておく（テスト用）
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} is not set"));

        let database = DatabaseConfig {
            host: required("DATABASE_HOST")?,
            port: required("DATABASE_PORT")?
                .parse::<u16>()
                .context("DATABASE_PORT must be a port number")?,
            username: required("DATABASE_USERNAME")?,
            password: required("DATABASE_PASSWORD")?,
            database: required("DATABASE_NAME")?,
        };

        let loan = LoanConfig {
            period_days: match lookup("LOAN_PERIOD_DAYS") {
                Some(v) => {
                    let days = v
                        .parse::<u32>()
                        .context("LOAN_PERIOD_DAYS must be a non-negative integer")?;
                    anyhow::ensure!(
                        days <= LoanConfig::MAX_PERIOD_DAYS,
                        "LOAN_PERIOD_DAYS must be at most {}",
                        LoanConfig::MAX_PERIOD_DAYS
                    );
                    days
                }
                None => LoanConfig::DEFAULT_PERIOD_DAYS,
            },
            fine_per_day: match lookup("LOAN_FINE_PER_DAY") {
                Some(v) => v
                    .parse::<u32>()
                    .context("LOAN_FINE_PER_DAY must be a non-negative integer")?
                    .into(),
                None => LoanConfig::DEFAULT_FINE_PER_DAY,
            },
        };

        let server = ServerConfig {
            port: match lookup("SERVER_PORT") {
                Some(v) => v.parse::<u16>().context("SERVER_PORT must be a port number")?,
                None => ServerConfig::DEFAULT_PORT,
            },
        };

        Ok(Self {
            database,
            loan,
            server,
        })
    }
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

// 貸出期間と延滞料金の設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanConfig {
    pub period_days: u32,
    pub fine_per_day: i64,
}

impl LoanConfig {
    pub const DEFAULT_PERIOD_DAYS: u32 = 7;
    pub const MAX_PERIOD_DAYS: u32 = 3650;
    pub const DEFAULT_FINE_PER_DAY: i64 = 1000;
}

impl Default for LoanConfig {
    fn default() -> Self {
        Self {
            period_days: Self::DEFAULT_PERIOD_DAYS,
            fine_per_day: Self::DEFAULT_FINE_PER_DAY,
        }
    }
}

pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 8080;
}
