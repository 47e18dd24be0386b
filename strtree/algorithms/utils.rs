use super::super::envelope::Envelope2D;
use geo::Geometry;

/// 从 geo::Geometry 计算包围盒，空几何体返回 None
pub fn geometry_to_envelope(geometry: &Geometry<f64>) -> Option<Envelope2D> {
    use geo::algorithm::bounding_rect::BoundingRect;

    geometry.bounding_rect().map(|rect| {
        Envelope2D::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    })
}

/// 向上取整的整数 k 次方根：满足 r^k >= n 的最小 r
pub(crate) fn iroot_ceil(n: usize, k: u32) -> usize {
    if n <= 1 || k <= 1 {
        return n;
    }

    // 浮点结果只作为初值，再用整数运算修正
    let mut r = (n as f64).powf(1.0 / f64::from(k)).round() as usize;
    while r > 1 && pow_at_least(r - 1, k, n) {
        r -= 1;
    }
    while !pow_at_least(r, k, n) {
        r += 1;
    }
    r
}

fn pow_at_least(base: usize, k: u32, n: usize) -> bool {
    base.checked_pow(k).map_or(true, |p| p >= n)
}

/// STR 分片使用的坐标轴顺序
///
/// 二维：先按 X 切成竖直分片，再在分片内按 Y 分组。
/// 三维：先按 Z 切成深度分片，然后与二维相同（X 再 Y）。
pub(crate) fn str_axes<const D: usize>() -> Vec<usize> {
    if D >= 3 {
        std::iter::once(D - 1).chain(0..D - 1).collect()
    } else {
        (0..D).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, LineString, Point, Polygon};

    #[test]
    fn test_iroot_ceil_square() {
        assert_eq!(iroot_ceil(255, 2), 16);
        assert_eq!(iroot_ceil(256, 2), 16);
        assert_eq!(iroot_ceil(257, 2), 17);
        assert_eq!(iroot_ceil(1, 2), 1);
        assert_eq!(iroot_ceil(2, 2), 2);
    }

    #[test]
    fn test_iroot_ceil_cube() {
        assert_eq!(iroot_ceil(8, 3), 2);
        assert_eq!(iroot_ceil(9, 3), 3);
        assert_eq!(iroot_ceil(27, 3), 3);
        assert_eq!(iroot_ceil(28, 3), 4);
        assert_eq!(iroot_ceil(1_000_000, 3), 100);
        assert_eq!(iroot_ceil(7, 1), 7);
    }

    #[test]
    fn test_str_axes() {
        assert_eq!(str_axes::<2>(), vec![0, 1]);
        assert_eq!(str_axes::<3>(), vec![2, 0, 1]);
    }

    #[test]
    fn test_geometry_to_envelope() {
        let polygon = Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 10.0, y: 0.0 },
                Coord { x: 10.0, y: 5.0 },
                Coord { x: 0.0, y: 0.0 },
            ]),
            vec![],
        ));
        assert_eq!(
            geometry_to_envelope(&polygon),
            Some(Envelope2D::new(0.0, 0.0, 10.0, 5.0))
        );

        let point = Geometry::Point(Point::new(3.0, 4.0));
        assert_eq!(
            geometry_to_envelope(&point),
            Some(Envelope2D::from_point([3.0, 4.0]))
        );

        let empty = Geometry::LineString(LineString::new(vec![]));
        assert_eq!(geometry_to_envelope(&empty), None);
    }
}
