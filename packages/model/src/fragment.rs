//! Detached declarative subtrees
//!
//! A [`Fragment`] describes nodes that do not exist in the graph yet. The
//! serializer produces them when loading, jobs consume them when inserting,
//! and [`crate::NodeGraph::extract`] produces them from live nodes for
//! duplication and structural comparison.

use serde::{Deserialize, Serialize};
use stagecraft_metadata::{ClassName, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Fragment {
    Instance(InstanceFragment),
    Reference { target: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceFragment {
    pub class: ClassName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub custom_root: bool,
    #[serde(default)]
    pub properties: Vec<PropertyFragment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFragment {
    pub name: String,
    pub content: ContentFragment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentFragment {
    Scalar(Value),
    Nodes(Vec<Fragment>),
}

impl Fragment {
    pub fn instance(class: impl Into<ClassName>) -> InstanceFragment {
        InstanceFragment::new(class)
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Fragment::Reference {
            target: target.into(),
        }
    }

    pub fn as_instance(&self) -> Option<&InstanceFragment> {
        match self {
            Fragment::Instance(instance) => Some(instance),
            Fragment::Reference { .. } => None,
        }
    }

    /// Copy with every instance identifier removed
    pub fn without_identifiers(&self) -> Fragment {
        match self {
            Fragment::Instance(instance) => Fragment::Instance(InstanceFragment {
                class: instance.class.clone(),
                identifier: None,
                custom_root: instance.custom_root,
                properties: instance
                    .properties
                    .iter()
                    .map(|property| PropertyFragment {
                        name: property.name.clone(),
                        content: match &property.content {
                            ContentFragment::Scalar(value) => ContentFragment::Scalar(value.clone()),
                            ContentFragment::Nodes(nodes) => ContentFragment::Nodes(
                                nodes.iter().map(Fragment::without_identifiers).collect(),
                            ),
                        },
                    })
                    .collect(),
            }),
            Fragment::Reference { target } => Fragment::Reference {
                target: target.clone(),
            },
        }
    }

    /// Number of instance and reference nodes described
    pub fn node_count(&self) -> usize {
        match self {
            Fragment::Reference { .. } => 1,
            Fragment::Instance(instance) => {
                1 + instance
                    .properties
                    .iter()
                    .map(|property| match &property.content {
                        ContentFragment::Scalar(_) => 0,
                        ContentFragment::Nodes(nodes) => nodes.iter().map(Fragment::node_count).sum(),
                    })
                    .sum::<usize>()
            }
        }
    }
}

impl InstanceFragment {
    pub fn new(class: impl Into<ClassName>) -> Self {
        Self {
            class: class.into(),
            identifier: None,
            custom_root: false,
            properties: Vec::new(),
        }
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn custom_root(mut self) -> Self {
        self.custom_root = true;
        self
    }

    /// Add a scalar property
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.push(PropertyFragment {
            name: name.into(),
            content: ContentFragment::Scalar(value.into()),
        });
        self
    }

    /// Add a collection property holding `children` in order
    pub fn children(mut self, name: impl Into<String>, children: Vec<Fragment>) -> Self {
        self.properties.push(PropertyFragment {
            name: name.into(),
            content: ContentFragment::Nodes(children),
        });
        self
    }

    pub fn build(self) -> Fragment {
        Fragment::Instance(self)
    }
}

impl From<InstanceFragment> for Fragment {
    fn from(instance: InstanceFragment) -> Self {
        Fragment::Instance(instance)
    }
}
