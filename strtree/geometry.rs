use super::algorithms::distance::{ItemBoundable, ItemDistance};
use super::algorithms::utils::geometry_to_envelope;
use super::node::ItemId;
use super::strtree::{IndexError, STRtree};
use derive_more::Display;
use geo::algorithm::closest_point::ClosestPoint;
use geo::algorithm::coords_iter::CoordsIter;
use geo::{Closest, Geometry, Intersects, Point};
use std::borrow::Borrow;

/// 带标识的几何对象，用作二维 STR 树的条目
#[derive(Debug, Display, Clone, PartialEq)]
#[display(fmt = "GeoItem {{ id: {}, geometry: {:?} }}", id, geometry)]
pub struct GeoItem {
    pub id: String,
    pub geometry: Geometry<f64>,
}

impl GeoItem {
    pub fn new(id: impl Into<String>, geometry: Geometry<f64>) -> Self {
        GeoItem {
            id: id.into(),
            geometry,
        }
    }
}

impl Borrow<Geometry<f64>> for GeoItem {
    fn borrow(&self) -> &Geometry<f64> {
        &self.geometry
    }
}

/// 几何条目相关操作（仅二维）
impl<T> STRtree<T, 2>
where
    T: Borrow<Geometry<f64>>,
{
    /// 以几何体的外包矩形为包围盒插入条目
    pub fn insert_geometry(&mut self, item: T) -> Result<ItemId, IndexError> {
        let envelope = geometry_to_envelope(item.borrow()).ok_or(IndexError::EmptyGeometry)?;
        self.insert(envelope, item)
    }
}

/// 两个几何体之间的平面欧氏距离，相交时为 0
///
/// 不相交时最短距离一定出现在某个几何体的顶点上，所以只需要计算双向的
/// 顶点到对方几何体的最近距离。空几何体的距离为无穷大。
pub fn geometry_distance(a: &Geometry<f64>, b: &Geometry<f64>) -> f64 {
    if a.intersects(b) {
        return 0.0;
    }
    vertex_distance(a, b).min(vertex_distance(b, a))
}

fn vertex_distance(from: &Geometry<f64>, to: &Geometry<f64>) -> f64 {
    from.coords_iter()
        .filter_map(|c| match to.closest_point(&Point::from(c)) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => Some((p.x() - c.x).hypot(p.y() - c.y)),
            Closest::Indeterminate => None,
        })
        .fold(f64::INFINITY, f64::min)
}

/// 按几何体本身（而不是包围盒）计算距离的度量
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryDistance;

impl<T> ItemDistance<T, 2> for GeometryDistance
where
    T: Borrow<Geometry<f64>>,
{
    fn distance(&self, a: &ItemBoundable<'_, T, 2>, b: &ItemBoundable<'_, T, 2>) -> f64 {
        geometry_distance(a.item.borrow(), b.item.borrow())
    }
}
