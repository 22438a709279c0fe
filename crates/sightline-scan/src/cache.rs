//! 핑거프린트 키 결과 캐시.
//!
//! 프레임 지각 해시 → 텍스트 영역 목록의 LRU 캐시.
//! 엔트리는 넣을 때와 꺼낼 때 모두 깊은 복사한다 — 호출자가
//! 좌표 변환으로 자기 사본을 고쳐도 캐시는 오염되지 않는다.
//!
//! 라이브 게임에서는 핑거프린트가 프레임 단위로 빠르게 바뀌므로,
//! 반용량 초과 상태로 일정 시간 미사용이면 증분 축출 대신 전체를
//! 비운다 (메모리 상한 + 단순성 우선, 히트율 희생).

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use sightline_core::error::CoreError;
use sightline_core::models::region::TextRegion;
use tracing::debug;

use crate::fingerprint::FrameFingerprint;

/// 텍스트 영역 결과 캐시
pub struct ResultCache {
    entries: LruCache<FrameFingerprint, Vec<TextRegion>>,
    capacity: usize,
    idle_clear: Duration,
    last_touch: Instant,
}

impl ResultCache {
    /// 용량과 유휴 클리어 주기로 캐시 생성
    pub fn new(capacity: usize, idle_clear: Duration) -> Result<Self, CoreError> {
        let cap = NonZeroUsize::new(capacity).ok_or_else(|| CoreError::Validation {
            field: "max_cache_entries".to_string(),
            message: "0보다 커야 함".to_string(),
        })?;
        Ok(Self {
            entries: LruCache::new(cap),
            capacity,
            idle_clear,
            last_touch: Instant::now(),
        })
    }

    /// 조회 — 히트 시 깊은 복사 반환 (최근 사용으로 승격)
    pub fn get(&mut self, fingerprint: &FrameFingerprint) -> Option<Vec<TextRegion>> {
        self.last_touch = Instant::now();
        self.entries.get(fingerprint).cloned()
    }

    /// 저장 — 깊은 복사로 소유. 용량 초과 시 LRU 엔트리 축출.
    pub fn put(&mut self, fingerprint: FrameFingerprint, regions: &[TextRegion]) {
        self.last_touch = Instant::now();
        self.entries.put(fingerprint, regions.to_vec());
    }

    /// 주기적 전체 클리어 정책 평가.
    ///
    /// 반용량 초과 + 유휴 기간 경과 시 전체를 비우고 `true` 반환.
    pub fn maybe_clear(&mut self) -> bool {
        self.maybe_clear_at(Instant::now())
    }

    /// 시각 주입 가능한 maybe_clear (결정적 테스트용)
    pub fn maybe_clear_at(&mut self, now: Instant) -> bool {
        let over_half = self.entries.len() > self.capacity / 2;
        let idle = now.duration_since(self.last_touch) >= self.idle_clear;
        if over_half && idle {
            debug!("결과 캐시 유휴 클리어: {}개 엔트리 제거", self.entries.len());
            self.entries.clear();
            self.last_touch = now;
            return true;
        }
        false
    }

    /// 전체 클리어
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_touch = Instant::now();
    }

    /// 현재 엔트리 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어 있는지
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sightline_core::models::geometry::Rect;

    fn regions(text: &str) -> Vec<TextRegion> {
        vec![TextRegion {
            bounds: Rect::new(0, 0, 50, 20),
            text: text.to_string(),
            confidence: 0.9,
            detected_at: Utc::now(),
        }]
    }

    fn cache(cap: usize) -> ResultCache {
        ResultCache::new(cap, Duration::from_secs(30)).unwrap()
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(ResultCache::new(0, Duration::from_secs(30)).is_err());
    }

    #[test]
    fn get_is_idempotent_until_next_put() {
        let mut cache = cache(10);
        cache.put(1, &regions("OK"));

        let first = cache.get(&1).unwrap();
        let second = cache.get(&1).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].text, second[0].text);
        assert_eq!(first[0].bounds, second[0].bounds);
    }

    #[test]
    fn mutating_returned_copy_does_not_corrupt_cache() {
        let mut cache = cache(10);
        cache.put(1, &regions("OK"));

        let mut copy = cache.get(&1).unwrap();
        copy[0].bounds = copy[0].bounds.translated(500, 500);
        copy[0].text.push_str("!!!");

        let fresh = cache.get(&1).unwrap();
        assert_eq!(fresh[0].bounds, Rect::new(0, 0, 50, 20));
        assert_eq!(fresh[0].text, "OK");
    }

    #[test]
    fn put_stores_deep_copy_of_input() {
        let mut cache = cache(10);
        let mut input = regions("OK");
        cache.put(1, &input);

        // 호출자 목록을 나중에 변형해도 캐시는 불변
        input[0].bounds = input[0].bounds.translated(100, 100);
        let cached = cache.get(&1).unwrap();
        assert_eq!(cached[0].bounds, Rect::new(0, 0, 50, 20));
    }

    #[test]
    fn capacity_bound_evicts_lru() {
        let mut cache = cache(3);
        cache.put(1, &regions("a"));
        cache.put(2, &regions("b"));
        cache.put(3, &regions("c"));

        // 1을 최근 사용으로 승격 → 2가 LRU
        let _ = cache.get(&1);
        cache.put(4, &regions("d"));

        assert_eq!(cache.len(), 3);
        assert!(cache.get(&2).is_none());
        assert!(cache.get(&1).is_some());
        assert!(cache.get(&4).is_some());
    }

    #[test]
    fn idle_clear_policy() {
        let mut cache = ResultCache::new(4, Duration::from_secs(10)).unwrap();
        cache.put(1, &regions("a"));
        cache.put(2, &regions("b"));
        cache.put(3, &regions("c")); // 3 > 4/2

        let now = Instant::now();
        // 유휴 기간 미경과 → 유지
        assert!(!cache.maybe_clear_at(now));
        assert_eq!(cache.len(), 3);

        // 유휴 기간 경과 → 전체 클리어
        assert!(cache.maybe_clear_at(now + Duration::from_secs(20)));
        assert!(cache.is_empty());
    }

    #[test]
    fn half_capacity_or_less_never_idle_cleared() {
        let mut cache = ResultCache::new(4, Duration::from_secs(10)).unwrap();
        cache.put(1, &regions("a"));
        cache.put(2, &regions("b")); // 2 == 4/2, 초과 아님

        let later = Instant::now() + Duration::from_secs(100);
        assert!(!cache.maybe_clear_at(later));
        assert_eq!(cache.len(), 2);
    }
}
