//! Lookup and creation of namespaced cluster resources

use anyhow::{Context, Result};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// A namespaced resource kind with a static type (k8s-openapi or CustomResource)
pub trait ClusterResource:
    Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
{
}

impl<K> ClusterResource for K where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
{
}

/// Where resources are looked up and created
#[allow(async_fn_in_trait)]
pub trait ResourceStore {
    /// Fetch a resource by name, `None` when it does not exist
    async fn find<K: ClusterResource>(&self, name: &str) -> Result<Option<K>>;

    /// Submit a new resource and return what the server stored
    async fn create<K: ClusterResource>(&self, resource: &K) -> Result<K>;

    /// Names of the resources matching a label selector
    async fn names_labeled<K: ClusterResource>(&self, selector: &str) -> Result<Vec<String>>;
}

/// Live cluster store scoped to one namespace
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    namespace: String,
}

impl KubeStore {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn api<K: ClusterResource>(&self) -> Api<K> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

impl ResourceStore for KubeStore {
    async fn find<K: ClusterResource>(&self, name: &str) -> Result<Option<K>> {
        self.api::<K>()
            .get_opt(name)
            .await
            .with_context(|| format!("Failed to look up {} '{}'", K::kind(&()), name))
    }

    async fn create<K: ClusterResource>(&self, resource: &K) -> Result<K> {
        self.api::<K>()
            .create(&PostParams::default(), resource)
            .await
            .with_context(|| {
                format!("Unable to create {} '{}'", K::kind(&()), resource.name_any())
            })
    }

    async fn names_labeled<K: ClusterResource>(&self, selector: &str) -> Result<Vec<String>> {
        let list = self
            .api::<K>()
            .list(&ListParams::default().labels(selector))
            .await
            .with_context(|| {
                format!(
                    "Error retrieving {} labeled {}. Are you logged in?",
                    K::kind(&()),
                    selector
                )
            })?;

        Ok(list.items.iter().map(|item| item.name_any()).collect())
    }
}

#[cfg(test)]
pub mod memory {
    //! In-memory store standing in for the cluster in tests

    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    type Key = (String, String);

    #[derive(Default)]
    pub struct MemoryStore {
        objects: RefCell<BTreeMap<Key, serde_json::Value>>,
        created: RefCell<Vec<Key>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed an object as if it already existed in the cluster
        pub fn insert<K: ClusterResource>(&self, resource: &K) {
            let key = (K::kind(&()).to_string(), resource.name_any());
            let value = serde_json::to_value(resource).expect("serializable resource");
            self.objects.borrow_mut().insert(key, value);
        }

        /// (kind, name) of every create call, in order
        pub fn created(&self) -> Vec<(String, String)> {
            self.created.borrow().clone()
        }

        pub fn len(&self) -> usize {
            self.objects.borrow().len()
        }
    }

    fn matches_selector(value: &serde_json::Value, selector: &str) -> bool {
        let labels = &value["metadata"]["labels"];
        selector.split(',').filter(|s| !s.is_empty()).all(|term| {
            match term.split_once('=') {
                Some((key, expected)) => labels[key].as_str() == Some(expected),
                None => !labels[term].is_null(),
            }
        })
    }

    impl ResourceStore for MemoryStore {
        async fn find<K: ClusterResource>(&self, name: &str) -> Result<Option<K>> {
            let key = (K::kind(&()).to_string(), name.to_string());
            match self.objects.borrow().get(&key) {
                Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
                None => Ok(None),
            }
        }

        async fn create<K: ClusterResource>(&self, resource: &K) -> Result<K> {
            let key = (K::kind(&()).to_string(), resource.name_any());
            if self.objects.borrow().contains_key(&key) {
                anyhow::bail!("{} '{}' already exists", key.0, key.1);
            }

            let mut value = serde_json::to_value(resource)?;
            value["metadata"]["uid"] = serde_json::Value::String(format!("uid-{}", key.1));
            value["metadata"]["namespace"] = serde_json::Value::String("test".to_string());

            self.objects.borrow_mut().insert(key.clone(), value.clone());
            self.created.borrow_mut().push(key);
            Ok(serde_json::from_value(value)?)
        }

        async fn names_labeled<K: ClusterResource>(&self, selector: &str) -> Result<Vec<String>> {
            let kind = K::kind(&()).to_string();
            Ok(self
                .objects
                .borrow()
                .iter()
                .filter(|((k, _), value)| *k == kind && matches_selector(value, selector))
                .map(|((_, name), _)| name.clone())
                .collect())
        }
    }
}
