//! # sightline-core
//!
//! SIGHTLINE 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 스캔 엔진과 어댑터 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 도메인 데이터 구조체 (serde Serialize/Deserialize)
//! - [`ports`] — Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 스캔 엔진 설정 구조체

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

#[cfg(test)]
mod tests {
    use crate::models::geometry::Rect;
    use crate::models::region::TextRegion;

    #[test]
    fn text_region_serde_roundtrip() {
        let region = TextRegion {
            bounds: Rect::new(10, 20, 120, 32),
            text: "저장하시겠습니까?".to_string(),
            confidence: 0.93,
            detected_at: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&region).unwrap();
        let deserialized: TextRegion = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.text, "저장하시겠습니까?");
        assert_eq!(deserialized.bounds, Rect::new(10, 20, 120, 32));
        assert!((deserialized.confidence - 0.93).abs() < f32::EPSILON);
    }

    #[test]
    fn config_defaults() {
        let config = crate::config::ScanConfig::default();
        assert_eq!(config.sample_size, 20);
        assert_eq!(config.grid_cols, 3);
        assert_eq!(config.grid_rows, 3);
        assert_eq!(config.min_interval_ms, 200);
        assert_eq!(config.max_interval_ms, 2_000);
        assert_eq!(config.max_cache_entries, 20);
        assert!(config.validate().is_ok());
    }
}
