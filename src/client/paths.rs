//! Endpoint paths of the Aruba Cloud API
//!
//! Item paths double as the `uri` a cloud server uses to reference its VPC, subnets,
//! security groups, volumes, key pair and elastic IP.

pub fn projects() -> String {
    "/projects".to_string()
}

pub fn project(project_id: &str) -> String {
    format!("/projects/{project_id}")
}

pub fn vpcs(project_id: &str) -> String {
    format!("/projects/{project_id}/providers/Aruba.Network/vpcs")
}

pub fn vpc(project_id: &str, vpc_id: &str) -> String {
    format!("{}/{vpc_id}", vpcs(project_id))
}

pub fn subnets(project_id: &str, vpc_id: &str) -> String {
    format!("{}/subnets", vpc(project_id, vpc_id))
}

pub fn subnet(project_id: &str, vpc_id: &str, subnet_id: &str) -> String {
    format!("{}/{subnet_id}", subnets(project_id, vpc_id))
}

pub fn security_groups(project_id: &str, vpc_id: &str) -> String {
    format!("{}/securityGroups", vpc(project_id, vpc_id))
}

pub fn security_group(project_id: &str, vpc_id: &str, group_id: &str) -> String {
    format!("{}/{group_id}", security_groups(project_id, vpc_id))
}

pub fn security_rules(project_id: &str, vpc_id: &str, group_id: &str) -> String {
    format!("{}/securityRules", security_group(project_id, vpc_id, group_id))
}

pub fn security_rule(project_id: &str, vpc_id: &str, group_id: &str, rule_id: &str) -> String {
    format!("{}/{rule_id}", security_rules(project_id, vpc_id, group_id))
}

pub fn key_pairs(project_id: &str) -> String {
    format!("/projects/{project_id}/providers/Aruba.Compute/keyPairs")
}

pub fn key_pair(project_id: &str, key_pair_id: &str) -> String {
    format!("{}/{key_pair_id}", key_pairs(project_id))
}

pub fn elastic_ips(project_id: &str) -> String {
    format!("/projects/{project_id}/providers/Aruba.Network/elasticIps")
}

pub fn elastic_ip(project_id: &str, elastic_ip_id: &str) -> String {
    format!("{}/{elastic_ip_id}", elastic_ips(project_id))
}

pub fn block_storages(project_id: &str) -> String {
    format!("/projects/{project_id}/providers/Aruba.Storage/blockStorages")
}

pub fn block_storage(project_id: &str, volume_id: &str) -> String {
    format!("{}/{volume_id}", block_storages(project_id))
}

pub fn cloud_servers(project_id: &str) -> String {
    format!("/projects/{project_id}/providers/Aruba.Compute/cloudServers")
}

pub fn cloud_server(project_id: &str, server_id: &str) -> String {
    format!("{}/{server_id}", cloud_servers(project_id))
}

/// Attach/detach endpoint for a server's data volumes
pub fn cloud_server_data_volumes(project_id: &str, server_id: &str) -> String {
    format!("{}/dataVolumes", cloud_server(project_id, server_id))
}
