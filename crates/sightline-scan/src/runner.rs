//! 스캔 타이머 루프.
//!
//! 단일 논리 타이머: 틱이 발화하면 파이프라인을 끝까지 실행한 뒤에야
//! 다음 틱을 무장한다 — 틱은 절대 재진입하지 않는다. 폴링 간격은
//! 매 틱 컨트롤러에서 새로 읽으므로 피드백 루프의 조정이 즉시 반영된다.

use std::sync::Arc;

use sightline_core::error::CoreError;
use sightline_core::ports::capture::FrameSource;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::orchestrator::ScanOrchestrator;

/// 캡처 → 스캔 루프 구동기
pub struct ScanRunner {
    orchestrator: ScanOrchestrator,
    frame_source: Arc<dyn FrameSource>,
}

impl ScanRunner {
    /// 오케스트레이터와 프레임 소스로 러너 생성
    pub fn new(orchestrator: ScanOrchestrator, frame_source: Arc<dyn FrameSource>) -> Self {
        Self {
            orchestrator,
            frame_source,
        }
    }

    /// 루프 실행 — 취소 토큰이 발화할 때까지.
    ///
    /// 캡처 실패(`None`)는 로그만 남기고 틱을 건너뛴다.
    /// 셧다운 시 진행 중인 틱은 협조적으로 중단되고 부분 결과는 폐기된다.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            "스캔 루프 시작: 초기 간격 {:?}",
            self.orchestrator.current_interval()
        );

        loop {
            let wait = self.orchestrator.current_interval();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    self.tick(&cancel).await;
                }
                _ = cancel.cancelled() => {
                    info!("스캔 루프 종료");
                    break;
                }
            }
        }
    }

    async fn tick(&mut self, cancel: &CancellationToken) {
        match self.frame_source.capture_window().await {
            Ok(Some(frame)) => {
                let regions = self.orchestrator.scan(&frame, cancel).await;
                debug!(
                    "틱 완료: {}개 영역, 다음 간격 {:?}",
                    regions.len(),
                    self.orchestrator.current_interval()
                );
            }
            Ok(None) => {
                // 창 최소화/핸들 무효 — 에러 아님
                debug!("캡처 대상 없음 — 틱 스킵");
            }
            Err(CoreError::Cancelled) => {}
            Err(e) => {
                warn!("창 캡처 실패: {e}");
            }
        }
    }
}
