use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::num::ParseFloatError;
use std::str::FromStr;

/// 轴对齐包围盒 - STR 树中每个节点的边界（MBR）
///
/// `D` 为维度（2 或 3）。空包围盒（null）是 `expand_to_include` 的单位元，
/// 与退化为一个点的包围盒不同：空包围盒不包含任何点。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "EnvelopeRepr", try_from = "EnvelopeRepr")]
pub struct Envelope<const D: usize> {
    min: [f64; D],
    max: [f64; D],
}

/// 二维包围盒
pub type Envelope2D = Envelope<2>;

/// 三维包围盒
pub type Envelope3D = Envelope<3>;

/// 文本格式解析错误，格式为 `Env[minX:maxX,minY:maxY(,minZ:maxZ)]`
#[derive(Debug, thiserror::Error)]
pub enum ParseEnvelopeError {
    #[error("missing 'Env[...]' brackets")]
    MissingBrackets,
    #[error("expected {expected} ordinates, found {found}")]
    WrongOrdinateCount { expected: usize, found: usize },
    #[error("invalid ordinate: {0}")]
    Ordinate(#[from] ParseFloatError),
}

impl<const D: usize> Envelope<D> {
    /// 创建空包围盒
    pub fn null() -> Self {
        Envelope {
            min: [f64::INFINITY; D],
            max: [f64::NEG_INFINITY; D],
        }
    }

    /// 由两个角点创建包围盒，每个轴上自动取较小值作为 min
    pub fn from_corners(a: [f64; D], b: [f64; D]) -> Self {
        let mut min = [0.0; D];
        let mut max = [0.0; D];
        for axis in 0..D {
            min[axis] = a[axis].min(b[axis]);
            max[axis] = a[axis].max(b[axis]);
        }
        Envelope { min, max }
    }

    /// 创建一个点包围盒
    pub fn from_point(p: [f64; D]) -> Self {
        Envelope { min: p, max: p }
    }

    pub fn is_null(&self) -> bool {
        // 任一轴 max < min 即为空
        (0..D).any(|axis| self.max[axis] < self.min[axis])
    }

    /// 重置为空包围盒
    pub fn set_to_null(&mut self) {
        *self = Self::null();
    }

    pub fn min(&self, axis: usize) -> f64 {
        self.min[axis]
    }

    pub fn max(&self, axis: usize) -> f64 {
        self.max[axis]
    }

    pub fn min_corner(&self) -> [f64; D] {
        self.min
    }

    pub fn max_corner(&self) -> [f64; D] {
        self.max
    }

    /// 指定轴上的跨度，空包围盒为 0
    pub fn extent(&self, axis: usize) -> f64 {
        if self.is_null() {
            return 0.0;
        }
        self.max[axis] - self.min[axis]
    }

    /// 指定轴上的中点（STR 排序键）
    pub fn mid(&self, axis: usize) -> f64 {
        (self.min[axis] + self.max[axis]) / 2.0
    }

    /// 中心点，空包围盒没有中心
    pub fn center(&self) -> Option<[f64; D]> {
        if self.is_null() {
            return None;
        }
        let mut c = [0.0; D];
        for (axis, v) in c.iter_mut().enumerate() {
            *v = self.mid(axis);
        }
        Some(c)
    }

    /// 面积（2D）或体积（3D）
    pub fn measure(&self) -> f64 {
        if self.is_null() {
            return 0.0;
        }
        (0..D).map(|axis| self.max[axis] - self.min[axis]).product()
    }

    /// 扩展到包含另一个包围盒，对方为空时不变
    pub fn expand_to_include(&mut self, other: &Envelope<D>) {
        if other.is_null() {
            return;
        }
        if self.is_null() {
            *self = *other;
            return;
        }
        for axis in 0..D {
            self.min[axis] = self.min[axis].min(other.min[axis]);
            self.max[axis] = self.max[axis].max(other.max[axis]);
        }
    }

    /// 扩展到包含一个点
    pub fn expand_to_include_point(&mut self, p: [f64; D]) {
        self.expand_to_include(&Envelope::from_point(p));
    }

    /// 两个包围盒的并集
    pub fn union(&self, other: &Envelope<D>) -> Envelope<D> {
        let mut result = *self;
        result.expand_to_include(other);
        result
    }

    /// 每个轴都重叠（接触也算相交）；任一方为空时返回 false
    pub fn intersects(&self, other: &Envelope<D>) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        (0..D).all(|axis| other.min[axis] <= self.max[axis] && other.max[axis] >= self.min[axis])
    }

    pub fn intersects_point(&self, p: [f64; D]) -> bool {
        self.intersects(&Envelope::from_point(p))
    }

    /// 当前包围盒是否完全包含另一个
    pub fn covers(&self, other: &Envelope<D>) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        (0..D).all(|axis| other.min[axis] >= self.min[axis] && other.max[axis] <= self.max[axis])
    }

    pub fn covers_point(&self, p: [f64; D]) -> bool {
        self.covers(&Envelope::from_point(p))
    }

    /// 交集，不相交或任一方为空时返回 None
    pub fn intersection(&self, other: &Envelope<D>) -> Option<Envelope<D>> {
        if !self.intersects(other) {
            return None;
        }
        let mut min = [0.0; D];
        let mut max = [0.0; D];
        for axis in 0..D {
            min[axis] = self.min[axis].max(other.min[axis]);
            max[axis] = self.max[axis].min(other.max[axis]);
        }
        Some(Envelope { min, max })
    }

    /// 平移，空包围盒不变
    pub fn translate(&mut self, delta: [f64; D]) {
        if self.is_null() {
            return;
        }
        for (axis, d) in delta.iter().enumerate() {
            self.min[axis] += d;
            self.max[axis] += d;
        }
    }

    /// 每个轴向两侧扩展 delta；负值收缩，收缩到消失时变为空包围盒
    pub fn expand_by(&mut self, delta: [f64; D]) {
        if self.is_null() {
            return;
        }
        for (axis, d) in delta.iter().enumerate() {
            self.min[axis] -= d;
            self.max[axis] += d;
        }
        if self.is_null() {
            self.set_to_null();
        }
    }

    /// 两个包围盒之间最小距离的平方，重叠时为 0
    ///
    /// 任一方为空时返回正无穷：空包围盒中没有任何点。
    pub fn distance_squared(&self, other: &Envelope<D>) -> f64 {
        if self.is_null() || other.is_null() {
            return f64::INFINITY;
        }
        let mut sum = 0.0;
        for axis in 0..D {
            let gap = if other.min[axis] > self.max[axis] {
                other.min[axis] - self.max[axis]
            } else if self.min[axis] > other.max[axis] {
                self.min[axis] - other.max[axis]
            } else {
                0.0
            };
            sum += gap * gap;
        }
        sum
    }

    /// 两个包围盒之间的最小距离（最近邻剪枝的下界）
    pub fn distance(&self, other: &Envelope<D>) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// 点到包围盒的最小距离，点在盒内时为 0
    pub fn distance_to_point(&self, p: [f64; D]) -> f64 {
        self.distance(&Envelope::from_point(p))
    }

    /// 两个包围盒中任意两点间距离的上界：并集对角线长度
    pub fn maximum_distance(&self, other: &Envelope<D>) -> f64 {
        let u = self.union(other);
        if u.is_null() {
            return f64::INFINITY;
        }
        (0..D)
            .map(|axis| {
                let e = u.max[axis] - u.min[axis];
                e * e
            })
            .sum::<f64>()
            .sqrt()
    }

    /// 规范全序：按 (min..., max...) 字典序比较，空包围盒小于任何非空包围盒
    pub fn cmp_canonical(&self, other: &Envelope<D>) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        self.min
            .iter()
            .chain(self.max.iter())
            .zip(other.min.iter().chain(other.max.iter()))
            .map(|(a, b)| a.total_cmp(b))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl Envelope<2> {
    /// 创建二维包围盒
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Envelope::from_corners([x_min, y_min], [x_max, y_max])
    }
}

impl Envelope<3> {
    /// 创建三维包围盒
    pub fn new(x_min: f64, y_min: f64, z_min: f64, x_max: f64, y_max: f64, z_max: f64) -> Self {
        Envelope::from_corners([x_min, y_min, z_min], [x_max, y_max, z_max])
    }
}

impl<const D: usize> Default for Envelope<D> {
    fn default() -> Self {
        Self::null()
    }
}

/// 与 [`Envelope::cmp_canonical`] 一致：所有空包围盒相等
impl<const D: usize> PartialEq for Envelope<D> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_canonical(other) == Ordering::Equal
    }
}

impl<const D: usize> PartialOrd for Envelope<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_canonical(other))
    }
}

impl<const D: usize> fmt::Display for Envelope<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Env[")?;
        for axis in 0..D {
            if axis > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}", self.min[axis], self.max[axis])?;
        }
        write!(f, "]")
    }
}

impl<const D: usize> FromStr for Envelope<D> {
    type Err = ParseEnvelopeError;

    /// 解析 `Env[7.2:2.3,7.1:8.2]` 形式的文本；每个轴的两个值不要求有序
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let open = s.find('[').ok_or(ParseEnvelopeError::MissingBrackets)?;
        let close = s.rfind(']').ok_or(ParseEnvelopeError::MissingBrackets)?;
        if close < open {
            return Err(ParseEnvelopeError::MissingBrackets);
        }

        let values = s[open + 1..close]
            .split([':', ','])
            .filter(|token| !token.trim().is_empty())
            .map(|token| token.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()?;

        if values.len() != 2 * D {
            return Err(ParseEnvelopeError::WrongOrdinateCount {
                expected: 2 * D,
                found: values.len(),
            });
        }

        let mut a = [0.0; D];
        let mut b = [0.0; D];
        for axis in 0..D {
            a[axis] = values[2 * axis];
            b[axis] = values[2 * axis + 1];
        }
        // 两个值都为无穷且 min > max 时是空包围盒的文本形式
        if (0..D).any(|axis| a[axis] > b[axis] && a[axis].is_infinite()) {
            return Ok(Envelope::null());
        }
        Ok(Envelope::from_corners(a, b))
    }
}

/// serde 中间表示：const 泛型数组没有现成的 Serialize 实现
#[derive(Serialize, Deserialize)]
struct EnvelopeRepr {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl<const D: usize> From<Envelope<D>> for EnvelopeRepr {
    fn from(env: Envelope<D>) -> Self {
        EnvelopeRepr {
            min: env.min.to_vec(),
            max: env.max.to_vec(),
        }
    }
}

impl<const D: usize> TryFrom<EnvelopeRepr> for Envelope<D> {
    type Error = ParseEnvelopeError;

    fn try_from(repr: EnvelopeRepr) -> Result<Self, Self::Error> {
        let found = repr.min.len().max(repr.max.len());
        let min: [f64; D] = repr.min.try_into().map_err(|_| {
            ParseEnvelopeError::WrongOrdinateCount {
                expected: 2 * D,
                found,
            }
        })?;
        let max: [f64; D] = repr.max.try_into().map_err(|_| {
            ParseEnvelopeError::WrongOrdinateCount {
                expected: 2 * D,
                found,
            }
        })?;
        // 任一轴倒置都视为空包围盒，与 is_null 保持一致
        if (0..D).any(|axis| max[axis] < min[axis]) {
            return Ok(Envelope::null());
        }
        Ok(Envelope { min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_envelope() {
        let null = Envelope2D::null();
        let rect = Envelope2D::new(0.0, 0.0, 1.0, 1.0);

        assert!(null.is_null());
        assert!(!rect.is_null());
        assert!(!Envelope2D::from_point([3.0, 4.0]).is_null());
        assert!(!null.intersects(&rect));
        assert!(!rect.intersects(&null));
        assert!(!null.intersects(&null));
        assert_eq!(null.intersection(&rect), None);
        assert_eq!(null.center(), None);
    }

    #[test]
    fn test_expand_to_include() {
        let mut env = Envelope2D::null();
        env.expand_to_include(&Envelope2D::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(env, Envelope2D::new(0.0, 0.0, 5.0, 5.0));

        env.expand_to_include(&Envelope2D::new(3.0, 3.0, 8.0, 8.0));
        assert_eq!(env, Envelope2D::new(0.0, 0.0, 8.0, 8.0));

        // 空包围盒不影响结果
        env.expand_to_include(&Envelope2D::null());
        assert_eq!(env, Envelope2D::new(0.0, 0.0, 8.0, 8.0));
    }

    #[test]
    fn test_corners_are_normalized() {
        let env = Envelope2D::new(5.0, 1.0, 2.0, 4.0);
        assert_eq!(env.min_corner(), [2.0, 1.0]);
        assert_eq!(env.max_corner(), [5.0, 4.0]);
    }

    #[test]
    fn test_intersects_touching() {
        let a = Envelope2D::new(0.0, 0.0, 1.0, 1.0);
        let b = Envelope2D::new(1.0, 1.0, 2.0, 2.0);
        let c = Envelope2D::new(1.5, 0.0, 2.0, 0.5);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.intersection(&b), Some(Envelope2D::new(1.0, 1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_covers_and_intersection() {
        let outer = Envelope3D::new(0.0, 0.0, 0.0, 10.0, 10.0, 10.0);
        let inner = Envelope3D::new(2.0, 2.0, 2.0, 8.0, 8.0, 8.0);
        let partial = Envelope3D::new(5.0, 5.0, 5.0, 15.0, 15.0, 15.0);

        assert!(outer.covers(&inner));
        assert!(!outer.covers(&partial));
        assert!(outer.covers_point([10.0, 0.0, 5.0]));
        assert_eq!(
            outer.intersection(&partial),
            Some(Envelope3D::new(5.0, 5.0, 5.0, 10.0, 10.0, 10.0))
        );
    }

    #[test]
    fn test_translate_and_expand_by() {
        let mut env = Envelope2D::new(0.0, 0.0, 2.0, 2.0);
        env.translate([1.0, -1.0]);
        assert_eq!(env, Envelope2D::new(1.0, -1.0, 3.0, 1.0));

        env.expand_by([1.0, 1.0]);
        assert_eq!(env, Envelope2D::new(0.0, -2.0, 4.0, 2.0));

        // 收缩到消失
        env.expand_by([-3.0, 0.0]);
        assert!(env.is_null());

        let mut null = Envelope2D::null();
        null.translate([1.0, 1.0]);
        assert!(null.is_null());
    }

    #[test]
    fn test_distance() {
        let a = Envelope2D::new(0.0, 0.0, 1.0, 1.0);
        let b = Envelope2D::new(4.0, 5.0, 6.0, 6.0);
        let overlapping = Envelope2D::new(0.5, 0.5, 3.0, 3.0);

        assert_eq!(a.distance_squared(&b), 9.0 + 16.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
        assert_eq!(a.distance(&overlapping), 0.0);
        assert_eq!(a.distance_to_point([0.5, 0.5]), 0.0);
        assert_eq!(a.distance_to_point([1.0, 3.0]), 2.0);
        assert_eq!(a.distance(&Envelope2D::null()), f64::INFINITY);
    }

    #[test]
    fn test_distance_3d() {
        let a = Envelope3D::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let b = Envelope3D::new(3.0, 1.0, 3.0, 4.0, 2.0, 4.0);
        assert_eq!(a.distance_squared(&b), 8.0);
    }

    #[test]
    fn test_maximum_distance() {
        let a = Envelope2D::from_point([0.0, 0.0]);
        let b = Envelope2D::from_point([3.0, 4.0]);
        assert_eq!(a.maximum_distance(&b), 5.0);
        assert!(a.maximum_distance(&b) >= a.distance(&b));
    }

    #[test]
    fn test_measure() {
        assert_eq!(Envelope2D::new(0.0, 0.0, 10.0, 5.0).measure(), 50.0);
        assert_eq!(Envelope3D::new(0.0, 0.0, 0.0, 2.0, 3.0, 4.0).measure(), 24.0);
        assert_eq!(Envelope2D::null().measure(), 0.0);
    }

    #[test]
    fn test_canonical_order() {
        let null = Envelope2D::null();
        let a = Envelope2D::new(0.0, 0.0, 1.0, 1.0);
        let b = Envelope2D::new(0.0, 1.0, 1.0, 2.0);
        let c = Envelope2D::new(0.0, 0.0, 2.0, 1.0);

        assert_eq!(null.cmp_canonical(&a), Ordering::Less);
        assert_eq!(a.cmp_canonical(&null), Ordering::Greater);
        assert_eq!(null.cmp_canonical(&Envelope2D::null()), Ordering::Equal);
        assert!(a < b);
        assert!(a < c);
        assert!(c < b);

        let mut envs = vec![b, null, c, a];
        envs.sort_by(|x, y| x.cmp_canonical(y));
        assert_eq!(envs, vec![null, a, c, b]);
    }

    #[test]
    fn test_parse_2d() {
        let env: Envelope2D = "Env[7.2:2.3,7.1:8.2]".parse().unwrap();
        assert_eq!(env, Envelope2D::new(2.3, 7.1, 7.2, 8.2));
    }

    #[test]
    fn test_text_round_trip() {
        let env3 = Envelope3D::new(-1.5, 2.0, 0.25, 3.0, 4.5, 9.0);
        let text = env3.to_string();
        assert_eq!(text, "Env[-1.5:3,2:4.5,0.25:9]");
        assert_eq!(text.parse::<Envelope3D>().unwrap(), env3);

        let env2 = Envelope2D::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(env2.to_string().parse::<Envelope2D>().unwrap(), env2);

        let null = Envelope2D::null();
        assert!(null.to_string().parse::<Envelope2D>().unwrap().is_null());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "7.2:2.3,7.1:8.2".parse::<Envelope2D>(),
            Err(ParseEnvelopeError::MissingBrackets)
        ));
        assert!(matches!(
            "Env[1:2,3:4]".parse::<Envelope3D>(),
            Err(ParseEnvelopeError::WrongOrdinateCount { expected: 6, found: 4 })
        ));
        assert!(matches!(
            "Env[1:x,3:4]".parse::<Envelope2D>(),
            Err(ParseEnvelopeError::Ordinate(_))
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let env = Envelope3D::new(0.0, 1.0, 2.0, 3.0, 4.0, 5.0);
        let json = serde_json::to_string(&env).unwrap();
        assert_eq!(json, r#"{"min":[0.0,1.0,2.0],"max":[3.0,4.0,5.0]}"#);
        let back: Envelope3D = serde_json::from_str(&json).unwrap();
        assert_eq!(back, env);

        assert!(serde_json::from_str::<Envelope2D>(&json).is_err());
    }

    #[test]
    fn test_deserialize_inverted_is_null() {
        let back: Envelope2D = serde_json::from_str(r#"{"min":[5.0,0.0],"max":[1.0,1.0]}"#).unwrap();
        assert!(back.is_null());
        assert_eq!(back, Envelope2D::null());
        assert_eq!(back.center(), None);
    }

    #[test]
    fn test_eq_consistent_with_order() {
        let pairs = [
            (Envelope2D::new(-0.0, 0.0, 1.0, 1.0), Envelope2D::new(0.0, 0.0, 1.0, 1.0)),
            (Envelope2D::new(0.0, 0.0, 1.0, 1.0), Envelope2D::new(0.0, 0.0, 1.0, 1.0)),
            (Envelope2D::new(0.0, 0.0, 1.0, 1.0), Envelope2D::new(0.0, 0.0, 2.0, 1.0)),
            (Envelope2D::null(), Envelope2D::from_corners([1.0, 1.0], [0.0, 0.0])),
        ];
        for (a, b) in pairs {
            assert_eq!(a == b, a.partial_cmp(&b) == Some(Ordering::Equal), "{} vs {}", a, b);
            assert_eq!(b == a, b.partial_cmp(&a) == Some(Ordering::Equal), "{} vs {}", b, a);
        }

        let mut inverted = Envelope2D::new(0.0, 0.0, 1.0, 1.0);
        inverted.set_to_null();
        assert_eq!(inverted, Envelope2D::null());
    }
}
