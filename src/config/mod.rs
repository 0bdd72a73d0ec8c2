use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::models::{PromoRule, SeatLabelScheme};
use crate::services::pricing::PromoTable;
use crate::services::selection::DEFAULT_MAX_SEATS;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub booking: BookingConfig,
    pub pricing: PricingConfig,
    pub payment: PaymentConfig,
    pub features: FeatureFlags,
}

// Настройки приложения
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// "pretty" или "json"
    pub log_format: String,
}

// Настройки сессий бронирования
#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub max_seats: usize,
    pub seat_scheme: SeatLabelScheme,
    pub session_ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
}

// Настройки расчёта стоимости
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Сервисный сбор автобусного сценария, базисные пункты (500 = 5%)
    pub bus_convenience_fee_bps: Option<u32>,
    /// Сервисный сбор для матчей; по умолчанию нет
    pub match_convenience_fee_bps: Option<u32>,
    pub promo_rules_file: Option<String>,
}

// Настройки имитации платежа
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub simulated_delay_ms: u64,
}

// Feature flags для включения/выключения функциональности
#[derive(Debug, Clone)]
pub struct FeatureFlags {
    pub enable_promos: bool,
    pub enable_merchandise: bool,
    pub enable_analytics: bool,
}

/// Верхняя граница лимита мест на сессию
pub const MAX_SEATS_LIMIT: usize = 10_000;
/// Верхняя граница TTL сессии: 30 дней
pub const MAX_SESSION_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Deserialize)]
struct PromoRulesFile {
    promos: Vec<PromoRule>,
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has invalid value {:?}: {}", key, raw, e)),
        _ => Ok(default),
    }
}

// Пустое значение или "none" выключает сбор
fn optional_bps(key: &str, default: Option<u32>) -> Result<Option<u32>> {
    match env::var(key) {
        Ok(raw) if raw.trim().eq_ignore_ascii_case("none") => Ok(None),
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a number of basis points", key)),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Config {
            app: AppConfig {
                host: env_or("HOST", "0.0.0.0".to_string())?,
                port: env_or("PORT", 8000)?,
                environment: env_or("ENVIRONMENT", "development".to_string())?,
                rust_log: env_or("RUST_LOG", "booking_system=debug,tower_http=debug".to_string())?,
                log_format: env_or("LOG_FORMAT", "pretty".to_string())?,
            },
            booking: BookingConfig {
                max_seats: env_or("MAX_SEATS", DEFAULT_MAX_SEATS)?,
                seat_scheme: env_or("SEAT_LABEL_SCHEME", SeatLabelScheme::default())?,
                session_ttl_seconds: env_or("SESSION_TTL_SECONDS", 1_800)?,
                cleanup_interval_seconds: env_or("CLEANUP_INTERVAL_SECONDS", 300)?,
            },
            pricing: PricingConfig {
                bus_convenience_fee_bps: optional_bps("BUS_CONVENIENCE_FEE_BPS", Some(500))?,
                match_convenience_fee_bps: optional_bps("MATCH_CONVENIENCE_FEE_BPS", None)?,
                promo_rules_file: env::var("PROMO_RULES_FILE").ok().filter(|s| !s.trim().is_empty()),
            },
            payment: PaymentConfig {
                simulated_delay_ms: env_or("PAYMENT_DELAY_MS", 2_000)?,
            },
            features: FeatureFlags {
                enable_promos: env_or("ENABLE_PROMOS", true)?,
                enable_merchandise: env_or("ENABLE_MERCHANDISE", true)?,
                enable_analytics: env_or("ENABLE_ANALYTICS", true)?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Проверка диапазонов, которые нельзя проверить парсингом
    pub fn validate(&self) -> Result<()> {
        let booking = &self.booking;
        if booking.max_seats == 0 || booking.max_seats > MAX_SEATS_LIMIT {
            anyhow::bail!("MAX_SEATS must be between 1 and {}, got {}", MAX_SEATS_LIMIT, booking.max_seats);
        }
        if booking.session_ttl_seconds > MAX_SESSION_TTL_SECONDS {
            anyhow::bail!(
                "SESSION_TTL_SECONDS must be at most {}, got {}",
                MAX_SESSION_TTL_SECONDS,
                booking.session_ttl_seconds
            );
        }
        Ok(())
    }

    /// Таблица промокодов: из файла, если он задан, иначе встроенная.
    pub fn load_promo_table(&self) -> Result<PromoTable> {
        let Some(path) = &self.pricing.promo_rules_file else {
            return Ok(PromoTable::defaults());
        };

        let file: PromoRulesFile = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .with_context(|| format!("failed to read promo rules from {}", path))?
            .try_deserialize()
            .with_context(|| format!("invalid promo rules in {}", path))?;

        Ok(PromoTable::new(file.promos))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                environment: "development".to_string(),
                rust_log: "booking_system=debug,tower_http=debug".to_string(),
                log_format: "pretty".to_string(),
            },
            booking: BookingConfig {
                max_seats: DEFAULT_MAX_SEATS,
                seat_scheme: SeatLabelScheme::default(),
                session_ttl_seconds: 1_800,
                cleanup_interval_seconds: 300,
            },
            pricing: PricingConfig {
                bus_convenience_fee_bps: Some(500),
                match_convenience_fee_bps: None,
                promo_rules_file: None,
            },
            payment: PaymentConfig {
                simulated_delay_ms: 2_000,
            },
            features: FeatureFlags {
                enable_promos: true,
                enable_merchandise: true,
                enable_analytics: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_bus_flow() {
        let config = Config::default();
        assert_eq!(config.booking.max_seats, 4);
        assert_eq!(config.pricing.bus_convenience_fee_bps, Some(500));
        assert_eq!(config.pricing.match_convenience_fee_bps, None);
        assert_eq!(config.load_promo_table().unwrap().len(), 5);
    }

    #[test]
    fn out_of_range_limits_are_rejected() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.booking.max_seats = 0;
        assert!(config.validate().is_err());
        config.booking.max_seats = 1_000_000_000_000;
        assert!(config.validate().is_err());

        config.booking.max_seats = MAX_SEATS_LIMIT;
        config.booking.session_ttl_seconds = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SESSION_TTL_SECONDS"));
    }

    #[test]
    fn promo_rules_load_from_file() {
        let path = env::temp_dir().join(format!("promos-{}.json", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"promos": [
                {{"code": "MONSOON", "discount": {{"percentage": 2500}}, "cap": 20000}},
                {{"code": "FLAT99", "discount": {{"fixed": 9900}}}}
            ]}}"#
        )
        .unwrap();

        let mut config = Config::default();
        config.pricing.promo_rules_file = Some(path.to_string_lossy().into_owned());
        let table = config.load_promo_table().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.len(), 2);
        assert!(table.lookup("SAVE50").is_none());
        let monsoon = table.lookup("MONSOON").unwrap();
        assert_eq!(monsoon.cap, Some(crate::models::Money(20_000)));
    }
}
