//! 프레임 지각 해시.
//!
//! 이미지 크기 + 희소 그리드 픽셀 샘플 기반 FNV-1a 해시.
//! 결과 캐시의 키로만 사용되며 영속화되지 않는다.
//! 암호학적 해시가 아니다 — 다른 이미지가 같은 키로 충돌하는 경우
//! (잘못된 캐시 히트)만 드물면 충분하다.

use image::DynamicImage;

/// 프레임 핑거프린트 — 캐시 키 전용
pub type FrameFingerprint = u64;

/// FNV-1a 초기값
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// 샘플 그리드 한 변의 점 개수 (8x8 = 64개 위치)
const SAMPLE_GRID: usize = 8;

/// 프레임 핑거프린트 계산.
///
/// 크기 (w, h)와 8x8 그리드의 셀 중앙 픽셀을 해싱한다.
/// 차이 게이트와 같은 셀 중앙 배치를 쓰므로 두 판정이 같은
/// 픽셀 집합을 본다. 샘플 위치 인덱스를 함께 섞어 같은 픽셀이
/// 다른 자리에 나타나는 프레임이 같은 키로 붕괴하지 않게 한다.
pub fn frame_fingerprint(image: &DynamicImage) -> FrameFingerprint {
    let rgba = image.to_rgba8();
    let (w, h) = rgba.dimensions();
    let raw = rgba.as_raw();

    let mut hash = fnv_mix(FNV_OFFSET, w as u64);
    hash = fnv_mix(hash, h as u64);

    if w == 0 || h == 0 {
        return hash;
    }

    let stride = w as usize * 4;

    for sy in 0..SAMPLE_GRID {
        let y = ((2 * sy + 1) * h as usize / (2 * SAMPLE_GRID)).min(h as usize - 1);
        let row_offset = y * stride;

        for sx in 0..SAMPLE_GRID {
            let x = ((2 * sx + 1) * w as usize / (2 * SAMPLE_GRID)).min(w as usize - 1);
            let offset = row_offset + x * 4;

            if let Some(px) = raw.get(offset..offset + 4) {
                let pixel = u32::from_le_bytes([px[0], px[1], px[2], px[3]]);
                let slot = (sy * SAMPLE_GRID + sx) as u64;
                hash = fnv_mix(hash, (slot << 32) | pixel as u64);
            }
        }
    }

    hash
}

fn fnv_mix(hash: u64, value: u64) -> u64 {
    (hash ^ value).wrapping_mul(FNV_PRIME)
}
