//! Service, Ingress, NetworkPolicy and PodDisruptionBudget checks.

use crate::analyzer::kubescore::config::ScoreConfig;
use crate::analyzer::kubescore::context::{Resource, ResourceBody};
use crate::analyzer::kubescore::registry::{Check, CheckError, CheckRegistry, RegistryError};
use crate::analyzer::kubescore::types::{Comment, Finding, Grade, ResourceKind};

pub fn register(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry.register(Check::new(
        "service-type",
        "Service Type",
        ResourceKind::Service,
        "Makes sure that the Service type is not NodePort",
        service_type,
    ))?;
    registry.register(
        Check::new(
            "ingress-has-tls",
            "Ingress has TLS",
            ResourceKind::Ingress,
            "Makes sure that Ingresses terminate TLS",
            ingress_tls,
        )
        .optional(),
    )?;
    registry.register(Check::new(
        "networkpolicy-has-policytypes",
        "NetworkPolicy has PolicyTypes",
        ResourceKind::NetworkPolicy,
        "Makes sure that NetworkPolicies have policyTypes set",
        network_policy_types,
    ))?;
    registry.register(Check::new(
        "poddisruptionbudget-has-policy",
        "PodDisruptionBudget has policy",
        ResourceKind::PodDisruptionBudget,
        "Makes sure that PodDisruptionBudgets specify minAvailable or maxUnavailable",
        pdb_policy,
    ))?;
    Ok(())
}

fn service_type(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    let ResourceBody::Service(spec) = &resource.body else {
        return Err(CheckError::UnexpectedBody { expected: "Service" });
    };

    if spec.type_.as_deref() == Some("NodePort") {
        return Ok(Finding::new(Grade::Warning).with_comment(Comment::new(
            "",
            "The service is of type NodePort",
            "NodePort services should be avoided as they are insecure, and can not be used together with NetworkPolicies. LoadBalancers or use of an Ingress is recommended over NodePorts.",
        )));
    }
    Ok(Finding::ok())
}

fn ingress_tls(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    let ResourceBody::Ingress(spec) = &resource.body else {
        return Err(CheckError::UnexpectedBody { expected: "Ingress" });
    };

    if spec.tls.as_ref().is_some_and(|tls| !tls.is_empty()) {
        return Ok(Finding::ok());
    }
    Ok(Finding::new(Grade::Warning).with_comment(Comment::new(
        "",
        "Ingress does not terminate TLS",
        "Traffic through this Ingress is unencrypted. Configure spec.tls with a certificate for each host.",
    )))
}

fn network_policy_types(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    let ResourceBody::NetworkPolicy(spec) = &resource.body else {
        return Err(CheckError::UnexpectedBody {
            expected: "NetworkPolicy",
        });
    };

    if spec.policy_types.as_ref().is_some_and(|t| !t.is_empty()) {
        return Ok(Finding::ok());
    }
    Ok(Finding::new(Grade::Critical).with_comment(Comment::new(
        "",
        "The NetworkPolicy does not have policyTypes set",
        "Without policyTypes the policy only applies to Ingress, and egress rules are silently ignored. Set spec.policyTypes explicitly.",
    )))
}

fn pdb_policy(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    let ResourceBody::PodDisruptionBudget(spec) = &resource.body else {
        return Err(CheckError::UnexpectedBody {
            expected: "PodDisruptionBudget",
        });
    };

    if spec.min_available.is_some() || spec.max_unavailable.is_some() {
        return Ok(Finding::ok());
    }
    Ok(Finding::new(Grade::Critical).with_comment(Comment::new(
        "",
        "PodDisruptionBudget missing policy",
        "A PodDisruptionBudget should set either spec.minAvailable or spec.maxUnavailable",
    )))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{resource, run};
    use super::*;

    #[test]
    fn test_service_type() {
        let yaml = "apiVersion: v1
kind: Service
metadata:
  name: web
spec:
  type: NodePort
  ports:
  - port: 80
    targetPort: 8080
";
        assert_eq!(run("service-type", yaml).grade, Grade::Warning);
        let cluster_ip = yaml.replace("NodePort", "ClusterIP");
        assert_eq!(run("service-type", &cluster_ip).grade, Grade::Ok);
    }

    #[test]
    fn test_ingress_tls() {
        let yaml = "apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: web
spec:
  rules:
  - host: example.com
";
        assert_eq!(run("ingress-has-tls", yaml).grade, Grade::Warning);
        let tls = format!("{yaml}  tls:\n  - hosts:\n    - example.com\n    secretName: web-tls\n");
        assert_eq!(run("ingress-has-tls", &tls).grade, Grade::Ok);
    }

    #[test]
    fn test_network_policy_types() {
        let yaml = "apiVersion: networking.k8s.io/v1
kind: NetworkPolicy
metadata:
  name: deny
spec:
  podSelector: {}
";
        assert_eq!(run("networkpolicy-has-policytypes", yaml).grade, Grade::Critical);
        let typed = format!("{yaml}  policyTypes:\n  - Ingress\n  - Egress\n");
        assert_eq!(run("networkpolicy-has-policytypes", &typed).grade, Grade::Ok);
    }

    #[test]
    fn test_pdb_policy() {
        let yaml = "apiVersion: policy/v1
kind: PodDisruptionBudget
metadata:
  name: web
spec:
  selector:
    matchLabels:
      app: web
";
        assert_eq!(run("poddisruptionbudget-has-policy", yaml).grade, Grade::Critical);
        let with_min = format!("{yaml}  minAvailable: 1\n");
        assert_eq!(run("poddisruptionbudget-has-policy", &with_min).grade, Grade::Ok);
    }

    #[test]
    fn test_wrong_body_is_a_fault() {
        let cm = resource("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: c\n");
        assert!(service_type(&cm, &ScoreConfig::default()).is_err());
    }
}
