//! Ready-made topology for a load-balanced container service.
//!
//! [`ContainerServiceBlueprint`] builds the model for a service running on
//! spot container capacity behind a load balancer: a two-zone network, task
//! and execution roles, a cluster, a task definition with one container,
//! the service itself, a health check and a CPU scaling policy. Every knob
//! has a default; setters override them before [`build`] assembles the
//! [`ResourceModel`].
//!
//! [`build`]: ContainerServiceBlueprint::build

use serde_json::json;
use tracing::debug;

use crate::error::ModelError;
use crate::model::{Resource, ResourceKind, ResourceModel};

/// Id of the network resource.
pub const NETWORK_ID: &str = "ecs-vpc";
/// Id of the role assumed by running tasks.
pub const TASK_ROLE_ID: &str = "task-role";
/// Id of the role used to pull images and ship logs.
pub const EXECUTION_ROLE_ID: &str = "execution-role";
/// Id of the cluster.
pub const CLUSTER_ID: &str = "ecs-cluster";
/// Id of the task definition.
pub const TASK_DEFINITION_ID: &str = "task-definition";
/// Id of the container.
pub const CONTAINER_ID: &str = "ecs-sample-app";
/// Id of the service.
pub const SERVICE_ID: &str = "ecs-fargate-service";
/// Id of the health check.
pub const HEALTH_CHECK_ID: &str = "health-check";
/// Id of the scaling policy.
pub const SCALING_POLICY_ID: &str = "cpu-scaling";

const TASK_PRINCIPAL: &str = "ecs-tasks.amazonaws.com";
const EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy";

/// Builder for a load-balanced container service model.
#[derive(Debug, Clone)]
pub struct ContainerServiceBlueprint {
    name: String,
    region: String,
    max_zones: u32,
    image: String,
    container_port: u16,
    log_stream_prefix: String,
    cpu: u32,
    memory_mib: u32,
    capacity_provider: String,
    capacity_weight: u32,
    health_check_path: String,
    health_check_interval_secs: u32,
    health_check_timeout_secs: u32,
    min_capacity: u32,
    max_capacity: u32,
    target_cpu_percent: u32,
}

impl ContainerServiceBlueprint {
    /// Creates a blueprint with the default settings.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: "us-east-1".to_string(),
            max_zones: 2,
            image: "amazon/amazon-ecs-sample".to_string(),
            container_port: 80,
            log_stream_prefix: "amazon-ecs-sample".to_string(),
            cpu: 512,
            memory_mib: 2048,
            capacity_provider: "FARGATE_SPOT".to_string(),
            capacity_weight: 1,
            health_check_path: "/".to_string(),
            health_check_interval_secs: 10,
            health_check_timeout_secs: 5,
            min_capacity: 1,
            max_capacity: 10,
            target_cpu_percent: 50,
        }
    }

    /// Sets the region passed to the container environment.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets the number of availability zones.
    #[must_use]
    pub const fn with_max_zones(mut self, zones: u32) -> Self {
        self.max_zones = zones;
        self
    }

    /// Sets the container image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Sets the container port.
    #[must_use]
    pub const fn with_container_port(mut self, port: u16) -> Self {
        self.container_port = port;
        self
    }

    /// Sets task CPU units and memory.
    #[must_use]
    pub const fn with_task_size(mut self, cpu: u32, memory_mib: u32) -> Self {
        self.cpu = cpu;
        self.memory_mib = memory_mib;
        self
    }

    /// Sets the capacity provider and its weight.
    #[must_use]
    pub fn with_capacity_provider(mut self, provider: impl Into<String>, weight: u32) -> Self {
        self.capacity_provider = provider.into();
        self.capacity_weight = weight;
        self
    }

    /// Sets the health check path.
    #[must_use]
    pub fn with_health_check_path(mut self, path: impl Into<String>) -> Self {
        self.health_check_path = path.into();
        self
    }

    /// Sets the scaling bounds.
    #[must_use]
    pub const fn with_capacity(mut self, min: u32, max: u32) -> Self {
        self.min_capacity = min;
        self.max_capacity = max;
        self
    }

    /// Sets the target CPU utilisation.
    #[must_use]
    pub const fn with_target_cpu_percent(mut self, percent: u32) -> Self {
        self.target_cpu_percent = percent;
        self
    }

    /// Builds the resource model.
    ///
    /// # Errors
    ///
    /// Returns an error if a resource is rejected by the model.
    pub fn build(&self) -> Result<ResourceModel, ModelError> {
        let mut model = ResourceModel::new(self.name.clone());

        model.add(Resource::new(NETWORK_ID, ResourceKind::Network).with_attribute("max_zones", self.max_zones))?;
        model.add(role(TASK_ROLE_ID))?;
        model.add(role(EXECUTION_ROLE_ID))?;

        model.add(
            Resource::new(CLUSTER_ID, ResourceKind::Cluster).with_attribute("network", token(NETWORK_ID)),
        )?;

        model.add(
            Resource::new(TASK_DEFINITION_ID, ResourceKind::TaskDefinition)
                .with_attribute("cpu", self.cpu)
                .with_attribute("memory_mib", self.memory_mib)
                .with_attribute("compatibility", "FARGATE")
                .with_attribute("task_role", token(TASK_ROLE_ID))
                .with_attribute("execution_role", token(EXECUTION_ROLE_ID)),
        )?;

        model.add(
            Resource::new(CONTAINER_ID, ResourceKind::Container)
                .with_attribute("image", self.image.as_str())
                .with_attribute("port_mappings", json!([{ "container_port": self.container_port }]))
                .with_attribute(
                    "logging",
                    json!({ "driver": "awslogs", "stream_prefix": self.log_stream_prefix }),
                )
                .with_attribute("environment", json!({ "region": self.region }))
                .with_reference(TASK_DEFINITION_ID),
        )?;

        model.add(
            Resource::new(SERVICE_ID, ResourceKind::Service)
                .with_attribute("load_balanced", true)
                .with_attribute(
                    "capacity_provider_strategies",
                    json!([{ "capacity_provider": self.capacity_provider, "weight": self.capacity_weight }]),
                )
                .with_reference(CLUSTER_ID)
                .with_reference(TASK_DEFINITION_ID),
        )?;

        model.add(
            Resource::new(HEALTH_CHECK_ID, ResourceKind::HealthCheck)
                .with_attribute("path", self.health_check_path.as_str())
                .with_attribute("interval_secs", self.health_check_interval_secs)
                .with_attribute("timeout_secs", self.health_check_timeout_secs)
                .with_attribute("target", token(SERVICE_ID)),
        )?;

        model.add(
            Resource::new(SCALING_POLICY_ID, ResourceKind::ScalingPolicy)
                .with_attribute("min_capacity", self.min_capacity)
                .with_attribute("max_capacity", self.max_capacity)
                .with_attribute("metric", "cpu_utilization")
                .with_attribute("target_utilization_percent", self.target_cpu_percent)
                .with_attribute("target", token(SERVICE_ID)),
        )?;

        debug!("Built blueprint '{}' with {} resources", self.name, model.len());
        Ok(model)
    }
}

fn role(id: &str) -> Resource {
    Resource::new(id, ResourceKind::Role)
        .with_attribute("assumed_by", TASK_PRINCIPAL)
        .with_attribute("managed_policies", json!([EXECUTION_POLICY_ARN]))
}

fn token(id: &str) -> String {
    format!("{{{{ref.{id}}}}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::model::ModelHasher;

    #[test]
    fn test_default_blueprint_compiles() {
        let model = ContainerServiceBlueprint::new("ecs-fargate").build().unwrap();
        assert_eq!(model.len(), 9);

        let plan = Compiler::default().plan_only(&model).unwrap();
        assert_eq!(
            plan.batch_ids(),
            vec![
                vec![NETWORK_ID, EXECUTION_ROLE_ID, TASK_ROLE_ID],
                vec![CLUSTER_ID, TASK_DEFINITION_ID],
                vec![SERVICE_ID, CONTAINER_ID],
                vec![SCALING_POLICY_ID, HEALTH_CHECK_ID],
            ]
        );
    }

    #[test]
    fn test_emitted_document_has_no_tokens() {
        let model = ContainerServiceBlueprint::new("ecs-fargate").build().unwrap();
        let document = Compiler::default().compile(&model).unwrap();

        assert!(!document.as_str().contains("{{"));
        let ir = document.parse().unwrap();
        let task = ir
            .batches
            .iter()
            .flatten()
            .find(|r| r.id == TASK_DEFINITION_ID)
            .unwrap();
        assert_eq!(task.attributes["task_role"], TASK_ROLE_ID);
        assert_eq!(task.depends_on, vec![EXECUTION_ROLE_ID, TASK_ROLE_ID]);
    }

    #[test]
    fn test_overrides_change_hash() {
        let default = ContainerServiceBlueprint::new("svc").build().unwrap();
        let bigger = ContainerServiceBlueprint::new("svc")
            .with_task_size(1024, 4096)
            .with_capacity(2, 20)
            .build()
            .unwrap();

        let hasher = ModelHasher::new();
        assert_ne!(hasher.hash_model(&default), hasher.hash_model(&bigger));

        let task = bigger.get(TASK_DEFINITION_ID).unwrap();
        assert_eq!(task.attribute("cpu"), Some(&json!(1024)));
    }

    #[test]
    fn test_token_format() {
        assert_eq!(token("vpc"), "{{ref.vpc}}");
    }
}
