//! CRD types that are shared between redpanda-pki-operator components, but aren't clearly owned by one of them.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use stackable_operator::{
    kube::{runtime::reflector::ObjectRef, Resource},
    schemars::{self, JsonSchema},
};

/// A `(name, namespace)` pair that identifies exactly one namespaced object.
///
/// Unlike k8s-openapi's references, both fields are mandatory.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespacedName {
    /// Namespace of the object being referred to.
    pub namespace: String,
    /// Name of the object being referred to.
    pub name: String,
}

impl NamespacedName {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Types this key as a reference to a `K`, for logging and error reporting.
    pub fn object_ref<K>(&self) -> ObjectRef<K>
    where
        K: Resource,
        K::DynamicType: Default,
    {
        ObjectRef::<K>::new(&self.name).within(&self.namespace)
    }
}

impl Display for NamespacedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use stackable_operator::k8s_openapi::api::core::v1::Secret;

    use super::NamespacedName;

    #[test]
    fn display_is_namespace_then_name() {
        assert_eq!(
            NamespacedName::new("redpanda-proxy-api-node", "ns1").to_string(),
            "ns1/redpanda-proxy-api-node"
        );
    }

    #[test]
    fn object_ref_keeps_name_and_namespace() {
        let object_ref = NamespacedName::new("redpanda-keystore", "ns1").object_ref::<Secret>();
        assert_eq!(object_ref.name, "redpanda-keystore");
        assert_eq!(object_ref.namespace.as_deref(), Some("ns1"));
    }
}
