//! 기하 모델.
//!
//! 캡처-로컬 / 창-로컬 / 스크린 좌표계를 오가는 직사각형 연산.
//! 좌표 변환은 항상 새 값을 만들어 반환한다 (clone-then-offset) —
//! 캐시에 들어간 영역의 bounds를 제자리에서 수정하는 일이 없도록.

use serde::{Deserialize, Serialize};

/// 직사각형 영역
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// 새 직사각형 생성
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// 빈 직사각형 여부
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// 두 직사각형의 교차 여부 (경계 접촉은 교차 아님)
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    /// 오프셋만큼 이동한 새 직사각형 반환 (원본 불변)
    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// 두 직사각형을 모두 덮는 최소 직사각형
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.w).max(other.x + other.w);
        let bottom = (self.y + self.h).max(other.y + other.h);
        Rect::new(x, y, right - x, bottom - y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersects_overlapping() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 50, 100, 100);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn edge_touching_is_not_intersection() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(100, 0, 50, 50);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn empty_rect_never_intersects() {
        let a = Rect::new(0, 0, 0, 100);
        let b = Rect::new(0, 0, 100, 100);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn translated_leaves_original_untouched() {
        let a = Rect::new(10, 20, 30, 40);
        let moved = a.translated(5, -5);
        assert_eq!(moved, Rect::new(15, 15, 30, 40));
        assert_eq!(a, Rect::new(10, 20, 30, 40));
    }

    #[test]
    fn union_covers_both() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 10, 10);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0, 0, 30, 30));
    }
}
