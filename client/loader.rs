use crate::strtree::{
    geometry_to_envelope, Envelope, Envelope2D, GeoItem, IndexError, ParseEnvelopeError, STRtree,
};
use geo::{Geometry, Rect};
use geojson::{feature::Id, Feature, GeoJson};
use std::fmt;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// 数据集加载错误
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected `<id> Env[...]`")]
    MissingEnvelope { line: usize },
    #[error("line {line}: {source}")]
    Envelope {
        line: usize,
        #[source]
        source: ParseEnvelopeError,
    },
    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("feature {index} has no geometry")]
    MissingGeometry { index: usize },
    #[error("failed to index dataset: {0}")]
    Index(#[from] IndexError),
}

/// 文本数据集中的一条记录：标识加包围盒
#[derive(Debug, Clone, PartialEq)]
pub struct Record<const D: usize> {
    pub id: String,
    pub envelope: Envelope<D>,
}

impl<const D: usize> fmt::Display for Record<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.envelope)
    }
}

/// 命令行工具可以处理的数据集条目
pub trait DatasetItem<const D: usize> {
    /// 用于输出的标识
    fn label(&self) -> &str;

    /// 条目的包围盒
    fn envelope(&self) -> Envelope<D>;

    /// 以包围盒构造一个查询条目
    fn query(envelope: Envelope<D>) -> Self;
}

impl<const D: usize> DatasetItem<D> for Record<D> {
    fn label(&self) -> &str {
        &self.id
    }

    fn envelope(&self) -> Envelope<D> {
        self.envelope
    }

    fn query(envelope: Envelope<D>) -> Self {
        Record {
            id: "query".to_string(),
            envelope,
        }
    }
}

impl DatasetItem<2> for GeoItem {
    fn label(&self) -> &str {
        &self.id
    }

    fn envelope(&self) -> Envelope2D {
        geometry_to_envelope(&self.geometry).unwrap_or_default()
    }

    fn query(envelope: Envelope2D) -> Self {
        let rect = Rect::new(
            geo::coord! { x: envelope.min(0), y: envelope.min(1) },
            geo::coord! { x: envelope.max(0), y: envelope.max(1) },
        );
        GeoItem::new("query", Geometry::Rect(rect))
    }
}

/// 是否按 GeoJSON 读取（根据扩展名判断）
pub fn is_geojson(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase).as_deref(),
        Some("geojson") | Some("json")
    )
}

/// 读取文本数据集，每行 `<id> Env[...]`，`#` 开头的行和空行被忽略
pub fn load_text<const D: usize>(path: &Path) -> Result<Vec<Record<D>>, LoadError> {
    let file = fs::File::open(path)?;
    let records = parse_text(BufReader::new(file))?;
    debug!(path = %path.display(), records = records.len(), "loaded text dataset");
    Ok(records)
}

pub fn parse_text<const D: usize, R: BufRead>(reader: R) -> Result<Vec<Record<D>>, LoadError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let content = line.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        let Some((id, env)) = content.split_once(char::is_whitespace) else {
            return Err(LoadError::MissingEnvelope { line: line_no });
        };
        let envelope = env
            .trim()
            .parse::<Envelope<D>>()
            .map_err(|source| LoadError::Envelope { line: line_no, source })?;
        records.push(Record {
            id: id.to_string(),
            envelope,
        });
    }
    Ok(records)
}

/// 读取 GeoJSON 数据集（FeatureCollection、Feature 或单个 Geometry）
pub fn load_geojson(path: &Path) -> Result<Vec<GeoItem>, LoadError> {
    let content = fs::read_to_string(path)?;
    let items = parse_geojson(&content)?;
    debug!(path = %path.display(), items = items.len(), "loaded GeoJSON dataset");
    Ok(items)
}

pub fn parse_geojson(content: &str) -> Result<Vec<GeoItem>, LoadError> {
    let features = match content.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => {
            return Ok(vec![GeoItem::new("0", geometry.try_into()?)]);
        }
    };

    features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let id = feature_id(&feature, index);
            let geometry = feature
                .geometry
                .ok_or(LoadError::MissingGeometry { index })?;
            Ok(GeoItem::new(id, geometry.try_into()?))
        })
        .collect()
}

/// 要素标识：优先使用 `id` 成员，其次是 `id` 属性，最后是要素序号
fn feature_id(feature: &Feature, index: usize) -> String {
    match &feature.id {
        Some(Id::String(s)) => s.clone(),
        Some(Id::Number(n)) => n.to_string(),
        None => match feature.property("id") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(value) => value.to_string(),
            None => index.to_string(),
        },
    }
}

/// 用文本记录构建树
pub fn build_tree<const D: usize>(
    records: Vec<Record<D>>,
    capacity: usize,
) -> Result<STRtree<Record<D>, D>, LoadError> {
    let mut tree = STRtree::new(capacity);
    for record in records {
        tree.insert(record.envelope, record)?;
    }
    Ok(tree)
}

/// 用几何条目构建二维树，跳过没有包围盒的空几何体
pub fn build_geo_tree(items: Vec<GeoItem>, capacity: usize) -> Result<STRtree<GeoItem, 2>, LoadError> {
    let mut tree = STRtree::new(capacity);
    for item in items {
        let id = item.id.clone();
        match tree.insert_geometry(item) {
            Ok(_) => {}
            Err(IndexError::EmptyGeometry) => warn!(%id, "skipping empty geometry"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(tree)
}
