//! 관심 영역 학습기.
//!
//! 창을 고정 그리드로 분할하고 셀별 OCR 히트/미스 이력을 누적하여
//! "지금 스캔할 가치가 있는" 부분 직사각형 집합을 추정한다.
//! 그리드 기하는 호출마다 현재 창 직사각형에서 새로 계산하고
//! 학습 카운트만 (col, row) 키로 유지한다 — 천천히 리사이즈되는
//! 창에서 허용 가능한 근사.

use std::collections::HashMap;

use sightline_core::config::ScanConfig;
use sightline_core::models::geometry::Rect;
use sightline_core::models::region::TextRegion;
use tracing::debug;

/// 셀별 학습 카운트
#[derive(Debug, Clone, Copy, Default)]
struct CellStats {
    success_count: u32,
    failure_count: u32,
}

/// 그리드 셀 학습기.
///
/// 감쇠 규칙은 leaky bucket이다: 연속 미스가 `failure_threshold`에
/// 도달해야 성공 카운트가 1 깎인다. 한 번의 빈 스캔으로 활성 셀이
/// 즉시 비활성화되지 않는다.
pub struct RegionLearner {
    grid_cols: u32,
    grid_rows: u32,
    success_threshold: u32,
    failure_threshold: u32,
    cells: HashMap<(u32, u32), CellStats>,
}

impl RegionLearner {
    /// 설정으로 학습기 생성
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            grid_cols: config.grid_cols,
            grid_rows: config.grid_rows,
            success_threshold: config.success_threshold,
            failure_threshold: config.failure_threshold,
            cells: HashMap::new(),
        }
    }

    /// 이번 스캔 사이클의 감지 결과를 학습에 반영.
    ///
    /// - 감지 영역과 교차하는 셀: 히트 (성공 +1, 실패 0 리셋)
    /// - 히트를 받지 못한 추적 중 셀: 미스 (실패 +1, 임계 도달 시 감쇠)
    /// - 빈 결과: 추적 중인 전 셀 미스
    pub fn update_regions(&mut self, window_rect: Rect, detected: &[TextRegion]) {
        if window_rect.is_empty() {
            return;
        }

        if detected.is_empty() {
            for stats in self.cells.values_mut() {
                Self::miss(stats, self.failure_threshold);
            }
            self.prune();
            return;
        }

        for row in 0..self.grid_rows {
            for col in 0..self.grid_cols {
                let cell = self.cell_rect(window_rect, col, row);
                let hit = detected.iter().any(|r| cell.intersects(&r.bounds));

                if hit {
                    let stats = self.cells.entry((col, row)).or_default();
                    stats.success_count = stats.success_count.saturating_add(1);
                    stats.failure_count = 0;
                } else if let Some(stats) = self.cells.get_mut(&(col, row)) {
                    Self::miss(stats, self.failure_threshold);
                }
            }
        }

        self.prune();
    }

    /// 현재 활성 셀들의 직사각형 집합.
    ///
    /// 인접한 활성 셀은 연결 성분 병합으로 합쳐 OCR 호출 수를 줄인다.
    /// 활성 셀이 하나도 없으면 전체 창을 반환한다 — 빈 스캔 집합을
    /// 돌려주면 감지가 영구히 굶주리므로.
    pub fn active_regions(&self, window_rect: Rect) -> Vec<Rect> {
        if window_rect.is_empty() {
            return vec![window_rect];
        }

        let cols = self.grid_cols as usize;
        let rows = self.grid_rows as usize;
        let mut active = vec![false; cols * rows];
        let mut any = false;

        for ((col, row), stats) in &self.cells {
            if stats.success_count >= self.success_threshold
                && (*col as usize) < cols
                && (*row as usize) < rows
            {
                active[*row as usize * cols + *col as usize] = true;
                any = true;
            }
        }

        if !any {
            return vec![window_rect];
        }

        let merged = merge_active_cells(&active, cols, rows);
        debug!("활성 영역 {}개 (병합 후)", merged.len());

        merged
            .into_iter()
            .map(|(c0, r0, c1, r1)| {
                let top_left = self.cell_rect(window_rect, c0 as u32, r0 as u32);
                let bottom_right = self.cell_rect(window_rect, c1 as u32, r1 as u32);
                top_left.union(&bottom_right)
            })
            .collect()
    }

    /// 학습 상태 초기화
    pub fn reset(&mut self) {
        self.cells.clear();
    }

    /// 추적 중인 셀 수 (테스트/진단용)
    pub fn tracked_cells(&self) -> usize {
        self.cells.len()
    }

    fn miss(stats: &mut CellStats, failure_threshold: u32) {
        stats.failure_count += 1;
        if stats.failure_count >= failure_threshold {
            // leaky bucket 감쇠 — 리셋이 아니라 1 감소
            stats.success_count = stats.success_count.saturating_sub(1);
            stats.failure_count = 0;
        }
    }

    fn prune(&mut self) {
        self.cells
            .retain(|_, s| s.success_count > 0 || s.failure_count > 0);
    }

    /// (col, row) 셀의 픽셀 직사각형.
    ///
    /// 정수 나눗셈 경계를 셀 양끝에서 따로 계산해 그리드가 창을
    /// 빈틈없이 덮도록 한다.
    fn cell_rect(&self, window: Rect, col: u32, row: u32) -> Rect {
        let x0 = window.x + (col as i64 * window.w as i64 / self.grid_cols as i64) as i32;
        let x1 = window.x + ((col + 1) as i64 * window.w as i64 / self.grid_cols as i64) as i32;
        let y0 = window.y + (row as i64 * window.h as i64 / self.grid_rows as i64) as i32;
        let y1 = window.y + ((row + 1) as i64 * window.h as i64 / self.grid_rows as i64) as i32;
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

/// 활성 셀 불리언 그리드의 연결 성분 병합.
///
/// 행마다 수평 연속 구간을 만들고, 열 범위가 같은 구간을
/// 세로로 이어 붙인다. 반환은 (c0, r0, c1, r1) 셀 인덱스 범위,
/// 행 우선 결정적 순서.
fn merge_active_cells(active: &[bool], cols: usize, rows: usize) -> Vec<(usize, usize, usize, usize)> {
    // (c0, c1, r0, r1) — r1은 아래로 확장될 수 있는 열린 구간
    let mut open: Vec<(usize, usize, usize, usize)> = Vec::new();
    let mut closed: Vec<(usize, usize, usize, usize)> = Vec::new();

    for row in 0..rows {
        // 이 행의 수평 구간 수집
        let mut runs: Vec<(usize, usize)> = Vec::new();
        let mut start: Option<usize> = None;
        for col in 0..cols {
            if active[row * cols + col] {
                start.get_or_insert(col);
            } else if let Some(s) = start.take() {
                runs.push((s, col - 1));
            }
        }
        if let Some(s) = start {
            runs.push((s, cols - 1));
        }

        // 직전 행에서 이어지는 구간은 확장, 아니면 닫기
        let mut next_open: Vec<(usize, usize, usize, usize)> = Vec::new();
        for (c0, c1) in runs {
            if let Some(pos) = open
                .iter()
                .position(|&(oc0, oc1, _, or1)| oc0 == c0 && oc1 == c1 && or1 + 1 == row)
            {
                let (oc0, oc1, or0, _) = open.remove(pos);
                next_open.push((oc0, oc1, or0, row));
            } else {
                next_open.push((c0, c1, row, row));
            }
        }
        closed.append(&mut open);
        open = next_open;
    }
    closed.append(&mut open);

    closed.sort_unstable_by_key(|&(c0, _, r0, _)| (r0, c0));
    closed
        .into_iter()
        .map(|(c0, c1, r0, r1)| (c0, r0, c1, r1))
        .collect()
}
