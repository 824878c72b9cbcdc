use crate::models::StageRegistry;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Half extents of the box every node is drawn in
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeBox {
    pub half_width: f64,
    pub half_height: f64,
}

impl NodeBox {
    pub fn from_size(width: f64, height: f64) -> Self {
        Self {
            half_width: width / 2.0,
            half_height: height / 2.0,
        }
    }
}

impl Default for NodeBox {
    fn default() -> Self {
        Self::from_size(180.0, 120.0)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("no position given for stage '{0}'")]
    MissingPosition(String),
    #[error("position given for unknown stage '{0}'")]
    UnknownStage(String),
}

/// Node centres for every stage, in ordinal order, plus edge captions
#[derive(Debug, Clone)]
pub struct Layout {
    centers: Vec<Point>,
    node_box: NodeBox,
    captions: HashMap<String, String>,
}

impl Layout {
    pub fn new(
        registry: &StageRegistry,
        positions: &[(&str, Point)],
        node_box: NodeBox,
    ) -> Result<Self, LayoutError> {
        let by_id: HashMap<&str, Point> = positions.iter().copied().collect();
        if let Some((id, _)) = positions.iter().find(|(id, _)| registry.by_id(id).is_none()) {
            return Err(LayoutError::UnknownStage(id.to_string()));
        }

        let centers = registry
            .stages()
            .iter()
            .map(|stage| {
                by_id
                    .get(stage.id.as_str())
                    .copied()
                    .ok_or_else(|| LayoutError::MissingPosition(stage.id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            centers,
            node_box,
            captions: HashMap::new(),
        })
    }

    /// Attach a caption to the edge between two stage ids
    pub fn with_caption(mut self, from_id: &str, to_id: &str, caption: &str) -> Self {
        self.captions
            .insert(format!("{}-{}", from_id, to_id), caption.to_string());
        self
    }

    /// Diagram positions of the serverless order flow
    pub fn serverless_order_flow(registry: &StageRegistry) -> Result<Self, LayoutError> {
        let layout = Self::new(
            registry,
            &[
                ("user", Point::new(400.0, 100.0)),
                ("apiGateway", Point::new(400.0, 300.0)),
                ("lambda1", Point::new(200.0, 480.0)),
                ("sqs", Point::new(400.0, 660.0)),
                ("lambda2", Point::new(600.0, 480.0)),
                ("dynamodb", Point::new(600.0, 720.0)),
                ("sns", Point::new(400.0, 860.0)),
            ],
            NodeBox::default(),
        )?;
        Ok(layout
            .with_caption("user", "apiGateway", "HTTP POST Request")
            .with_caption("apiGateway", "lambda1", "Invoke Function")
            .with_caption("lambda1", "sqs", "Publish Message")
            .with_caption("sqs", "lambda2", "Poll Queue")
            .with_caption("lambda2", "dynamodb", "Write Data")
            .with_caption("dynamodb", "sns", "Send Notification"))
    }

    pub fn center(&self, ordinal: usize) -> Option<Point> {
        self.centers.get(ordinal).copied()
    }

    pub fn node_box(&self) -> NodeBox {
        self.node_box
    }

    pub fn caption(&self, from_id: &str, to_id: &str) -> Option<&str> {
        self.captions
            .get(&format!("{}-{}", from_id, to_id))
            .map(String::as_str)
    }
}
