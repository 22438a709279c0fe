//! 스캔 오케스트레이터.
//!
//! 틱 하나의 전체 파이프라인을 조율한다:
//! 차이 게이트 → 핑거프린트/캐시 조회 → 활성 영역 선택 →
//! (점진적 재시도 포함) OCR 호출 → 신뢰도 필터 → 학습/간격 피드백 →
//! 캐시 저장 → 호출자 이벤트 발화.
//!
//! 학습기/컨트롤러/캐시의 가변 상태는 모두 이 구조체가 단독 소유하며
//! 단일 틱 핸들러에서만 변이된다. 영역 스캔은 안정된 순서로 직렬
//! 실행되므로 같은 입력에 대해 학습 갱신이 재현 가능하다.

use std::sync::Arc;

use image::DynamicImage;
use sightline_core::config::ScanConfig;
use sightline_core::error::CoreError;
use sightline_core::models::geometry::Rect;
use sightline_core::models::region::{same_text_set, TextRegion};
use sightline_core::ports::capture::FrameSource;
use sightline_core::ports::events::ScanEvents;
use sightline_core::ports::ocr::OcrBackend;
use sightline_core::ports::preprocess::PresetCycle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::ResultCache;
use crate::diff::FrameDiffGate;
use crate::fingerprint::frame_fingerprint;
use crate::interval::IntervalController;
use crate::regions::RegionLearner;

/// 적응형 스캔 오케스트레이터
pub struct ScanOrchestrator {
    config: ScanConfig,
    diff_gate: FrameDiffGate,
    learner: RegionLearner,
    interval: IntervalController,
    cache: ResultCache,
    ocr: Arc<dyn OcrBackend>,
    frame_source: Arc<dyn FrameSource>,
    presets: Box<dyn PresetCycle>,
    events: Arc<dyn ScanEvents>,
    /// 비재진입 가드 — 틱 겹침 시 큐잉 없이 드랍
    in_flight: bool,
    consecutive_errors: u32,
    /// 텍스트 소실 히스테리시스용 연속 빈 틱 카운터
    empty_ticks: u32,
    had_regions: bool,
    last_emitted: Vec<TextRegion>,
    last_had_text: bool,
}

impl ScanOrchestrator {
    /// 포트 와이어링으로 오케스트레이터 생성.
    ///
    /// 설정 경계 위반은 여기서 즉시 실패한다.
    pub fn new(
        config: ScanConfig,
        ocr: Arc<dyn OcrBackend>,
        frame_source: Arc<dyn FrameSource>,
        presets: Box<dyn PresetCycle>,
        events: Arc<dyn ScanEvents>,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        Ok(Self {
            diff_gate: FrameDiffGate::new(&config),
            learner: RegionLearner::new(&config),
            interval: IntervalController::new(&config)?,
            cache: ResultCache::new(config.max_cache_entries, config.cache_idle_clear())?,
            config,
            ocr,
            frame_source,
            presets,
            events,
            in_flight: false,
            consecutive_errors: 0,
            empty_ticks: 0,
            had_regions: false,
            last_emitted: Vec::new(),
            last_had_text: false,
        })
    }

    /// 틱 하나 실행 — 캡처된 창 이미지에서 텍스트 영역 목록 산출.
    ///
    /// 모든 실패는 "이번 틱은 영역 없음"으로 강등된다.
    /// 취소된 틱의 부분 결과는 커밋 없이 폐기된다.
    pub async fn scan(
        &mut self,
        frame: &DynamicImage,
        cancel: &CancellationToken,
    ) -> Vec<TextRegion> {
        if self.in_flight {
            debug!("이전 틱 진행 중 — 이번 틱 드랍");
            return Vec::new();
        }
        self.in_flight = true;

        let result = self.scan_inner(frame, cancel).await;
        self.in_flight = false;

        match result {
            Ok(regions) => regions,
            Err(CoreError::Cancelled) => {
                debug!("틱 취소됨 — 부분 결과 폐기");
                Vec::new()
            }
            Err(e) => {
                warn!("스캔 틱 실패: {e}");
                self.note_error();
                Vec::new()
            }
        }
    }

    /// 현재 폴링 간격 (스케줄러가 다음 틱을 무장할 때 읽음)
    pub fn current_interval(&self) -> std::time::Duration {
        self.interval.current()
    }

    /// 전체 상태 초기화 (게이트, 학습, 간격, 캐시, 이벤트 상태)
    pub fn reset(&mut self) {
        self.diff_gate.reset();
        self.learner.reset();
        self.interval.reset();
        self.cache.clear();
        self.presets.reset();
        self.consecutive_errors = 0;
        self.empty_ticks = 0;
        self.had_regions = false;
        self.last_emitted.clear();
        self.last_had_text = false;
    }

    async fn scan_inner(
        &mut self,
        frame: &DynamicImage,
        cancel: &CancellationToken,
    ) -> Result<Vec<TextRegion>, CoreError> {
        // 1. 차이 게이트 — 변경 없는 틱은 OCR/학습/이벤트 모두 건너뜀
        let frame_changed = self.diff_gate.has_significant_change(frame);
        if !frame_changed {
            self.interval.update(false, self.last_had_text);
            return Ok(Vec::new());
        }

        // 2. 핑거프린트 + 캐시 조회
        self.cache.maybe_clear();
        let fingerprint = frame_fingerprint(frame);
        if let Some(hit) = self.cache.get(&fingerprint) {
            debug!("캐시 히트: {}개 영역 (OCR 생략)", hit.len());
            self.interval.update(true, !hit.is_empty());
            self.dispatch_events(&hit);
            self.last_had_text = !hit.is_empty();
            return Ok(hit);
        }

        // 3. 스캔 대상 선택
        let window_rect = Rect::new(0, 0, frame.width() as i32, frame.height() as i32);
        let targets = self.learner.active_regions(window_rect);

        // 4. 점진적 재시도 — 실패할 때마다 신뢰도 완화 + 프리셋 전진
        let mut effective_confidence = self.config.min_confidence;
        let mut found = Vec::new();
        let mut had_ocr_error = false;

        for attempt in 0..self.config.max_attempts {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled);
            }

            if attempt > 0 {
                effective_confidence =
                    (effective_confidence - self.config.confidence_relax_step).max(0.0);
                self.presets.advance();
                debug!(
                    "점진적 재시도 {}/{} (신뢰도 {:.2}, 프리셋 {:?})",
                    attempt + 1,
                    self.config.max_attempts,
                    effective_confidence,
                    self.presets.current_preset()
                );
            }

            let (mut raw, errored) = self
                .scan_targets(frame, window_rect, &targets, cancel)
                .await?;
            had_ocr_error |= errored;

            // 5. 신뢰도 필터
            raw.retain(|r| r.confidence >= effective_confidence);

            if !raw.is_empty() {
                found = raw;
                break;
            }
        }

        if !found.is_empty() {
            self.presets.reset();
        }

        // 6. 피드백 — 학습기 + 간격 컨트롤러
        self.learner.update_regions(window_rect, &found);
        self.interval.update(frame_changed, !found.is_empty());

        // 텍스트 출현/소실 직후에는 일회성 즉시 반응
        if !found.is_empty() && !self.last_had_text {
            self.interval.temporarily_decrease();
        } else if found.is_empty() && self.last_had_text {
            self.interval.temporarily_increase();
        }

        // 7. 캐시 저장 (빈 결과는 저장하지 않음 — 재시도 기회 유지)
        if !found.is_empty() {
            self.cache.put(fingerprint, &found);
        }

        // 8. 이벤트 + 에러 카운터 정산
        self.dispatch_events(&found);
        self.last_had_text = !found.is_empty();

        if had_ocr_error {
            self.note_error();
        } else {
            self.consecutive_errors = 0;
        }

        Ok(found)
    }

    /// 대상 직사각형들을 안정된 순서로 직렬 스캔.
    ///
    /// 영역 단위 OCR 실패는 해당 영역만 빈 결과로 강등하고 계속한다.
    /// 반환: (창-로컬 좌표로 변환된 결과, 에러 발생 여부)
    async fn scan_targets(
        &self,
        frame: &DynamicImage,
        window_rect: Rect,
        targets: &[Rect],
        cancel: &CancellationToken,
    ) -> Result<(Vec<TextRegion>, bool), CoreError> {
        let mut collected = Vec::new();
        let mut errored = false;

        let full_frame = targets.len() == 1 && targets[0] == window_rect;

        for target in targets {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled);
            }

            let result = if full_frame {
                self.ocr.detect_text_regions(frame, cancel).await
            } else {
                let crop = crop_to_window(frame, window_rect, *target);
                match crop {
                    Some(cropped) => self.ocr.detect_text_regions(&cropped, cancel).await,
                    None => continue, // 창 밖으로 완전히 벗어난 대상
                }
            };

            match result {
                Ok(regions) => {
                    if full_frame {
                        collected.extend(regions);
                    } else {
                        // 영역-로컬 → 창-로컬 (원본 불변, 복사 후 오프셋)
                        collected
                            .extend(regions.iter().map(|r| r.translated(target.x, target.y)));
                    }
                }
                Err(CoreError::Cancelled) => return Err(CoreError::Cancelled),
                Err(e) => {
                    warn!("영역 OCR 실패 ({:?}): {e}", target);
                    errored = true;
                }
            }
        }

        Ok((collected, errored))
    }

    /// 이벤트 발화 규칙.
    ///
    /// - 비어 있지 않은 결과: 직전 발화와 텍스트 집합이 다를 때만
    ///   `on_regions_detected`
    /// - 빈 결과: 텍스트가 있던 상태에서 연속 빈 틱이 임계값을 채우면
    ///   `on_no_regions_detected` 1회 (깜빡임 히스테리시스)
    fn dispatch_events(&mut self, found: &[TextRegion]) {
        if !found.is_empty() {
            self.empty_ticks = 0;
            if !self.had_regions || !same_text_set(found, &self.last_emitted) {
                self.events.on_regions_detected(found);
                self.last_emitted = found.to_vec();
            }
            self.had_regions = true;
        } else if self.had_regions {
            self.empty_ticks += 1;
            if self.empty_ticks >= self.config.no_text_ticks {
                self.events.on_no_regions_detected();
                self.had_regions = false;
                self.empty_ticks = 0;
                self.last_emitted.clear();
            }
        }
    }

    /// 연속 에러 정산 — 임계 도달 시 방어적 리셋
    fn note_error(&mut self) {
        self.consecutive_errors += 1;
        if self.consecutive_errors >= self.config.error_reset_threshold {
            warn!(
                "연속 에러 {}회 — 방어적 리셋 수행",
                self.consecutive_errors
            );
            self.cache.clear();
            self.diff_gate.reset();
            self.presets.reset();
            self.frame_source.release_resources();
            self.consecutive_errors = 0;
        }
    }
}

/// 대상 직사각형을 창 경계로 클램프하여 잘라내기.
///
/// 완전히 창 밖이면 `None`.
fn crop_to_window(frame: &DynamicImage, window: Rect, target: Rect) -> Option<DynamicImage> {
    let x0 = target.x.max(window.x).max(0);
    let y0 = target.y.max(window.y).max(0);
    let x1 = (target.x + target.w).min(window.x + window.w);
    let y1 = (target.y + target.h).min(window.y + window.h);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some(frame.crop_imm(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use image::RgbaImage;
    use parking_lot::Mutex;
    use sightline_core::ports::events::NullScanEvents;
    use sightline_core::ports::preprocess::StaticPresetCycle;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 스크립트된 응답을 차례로 돌려주는 OCR 백엔드 목
    struct ScriptedOcr {
        responses: Mutex<Vec<Vec<TextRegion>>>,
        calls: AtomicUsize,
    }

    impl ScriptedOcr {
        fn new(responses: Vec<Vec<TextRegion>>) -> Self {
            let mut reversed = responses;
            reversed.reverse();
            Self {
                responses: Mutex::new(reversed),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OcrBackend for ScriptedOcr {
        async fn initialize(&self) -> Result<(), CoreError> {
            Ok(())
        }

        async fn detect_text_regions(
            &self,
            _image: &DynamicImage,
            _cancel: &CancellationToken,
        ) -> Result<Vec<TextRegion>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.responses.lock().pop().unwrap_or_default())
        }

        fn backend_name(&self) -> &str {
            "scripted"
        }
    }

    struct NullFrameSource;

    #[async_trait]
    impl FrameSource for NullFrameSource {
        async fn capture_window(&self) -> Result<Option<DynamicImage>, CoreError> {
            Ok(None)
        }

        fn release_resources(&self) {}
    }

    fn region(text: &str) -> TextRegion {
        TextRegion {
            bounds: Rect::new(0, 0, 50, 20),
            text: text.to_string(),
            confidence: 0.9,
            detected_at: Utc::now(),
        }
    }

    fn make_frame(color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 200, image::Rgba(color)))
    }

    fn orchestrator(
        config: ScanConfig,
        ocr: Arc<ScriptedOcr>,
    ) -> ScanOrchestrator {
        ScanOrchestrator::new(
            config,
            ocr,
            Arc::new(NullFrameSource),
            Box::new(StaticPresetCycle::standard()),
            Arc::new(NullScanEvents),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn in_flight_guard_drops_tick() {
        let ocr = Arc::new(ScriptedOcr::new(vec![vec![region("OK")]]));
        let mut orch = orchestrator(ScanConfig::default(), ocr.clone());
        let cancel = CancellationToken::new();

        orch.in_flight = true;
        let result = orch.scan(&make_frame([0, 0, 0, 255]), &cancel).await;
        assert!(result.is_empty());
        assert_eq!(ocr.call_count(), 0);
    }

    #[tokio::test]
    async fn unchanged_frame_skips_ocr() {
        let ocr = Arc::new(ScriptedOcr::new(vec![
            vec![region("OK")],
            vec![region("OK")],
        ]));
        let mut orch = orchestrator(ScanConfig::default(), ocr.clone());
        let cancel = CancellationToken::new();
        let frame = make_frame([10, 10, 10, 255]);

        let first = orch.scan(&frame, &cancel).await;
        assert_eq!(first.len(), 1);
        assert_eq!(ocr.call_count(), 1);

        // 동일 프레임 — 게이트에서 차단, 백엔드 호출 없음
        let second = orch.scan(&frame, &cancel).await;
        assert!(second.is_empty());
        assert_eq!(ocr.call_count(), 1);
    }

    #[tokio::test]
    async fn cancelled_tick_commits_nothing() {
        let ocr = Arc::new(ScriptedOcr::new(vec![vec![region("OK")]]));
        let mut orch = orchestrator(ScanConfig::default(), ocr.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = orch.scan(&make_frame([0, 0, 0, 255]), &cancel).await;
        assert!(result.is_empty());
        assert_eq!(ocr.call_count(), 0);
        assert!(orch.cache.is_empty());
        assert_eq!(orch.learner.tracked_cells(), 0);
    }

    #[tokio::test]
    async fn low_confidence_results_filtered() {
        let weak = TextRegion {
            confidence: 0.2,
            ..region("faint")
        };
        // 3회 시도 모두 저신뢰 결과 — 완화 후에도 0.5 아래
        let ocr = Arc::new(ScriptedOcr::new(vec![
            vec![weak.clone()],
            vec![weak.clone()],
            vec![weak.clone()],
        ]));
        let mut orch = orchestrator(ScanConfig::default(), ocr.clone());
        let cancel = CancellationToken::new();

        let result = orch.scan(&make_frame([0, 0, 0, 255]), &cancel).await;
        assert!(result.is_empty());
        assert_eq!(ocr.call_count(), 3);
    }

    #[test]
    fn crop_clamps_to_window() {
        let frame = make_frame([0, 0, 0, 255]);
        let window = Rect::new(0, 0, 200, 200);

        let cropped = crop_to_window(&frame, window, Rect::new(150, 150, 100, 100)).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (50, 50));

        assert!(crop_to_window(&frame, window, Rect::new(300, 300, 50, 50)).is_none());
    }
}
