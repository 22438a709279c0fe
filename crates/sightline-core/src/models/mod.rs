//! SIGHTLINE 도메인 모델.
//!
//! 스캔 엔진과 호출자 간 공유하는 핵심 데이터 구조체를 정의한다.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod geometry;
pub mod region;
