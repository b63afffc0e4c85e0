//! # CRD Generator
//!
//! Prints the CustomResourceDefinition YAML of every Aruba resource kind.
//!
//! ## Usage
//!
//! ```bash
//! # All kinds, as one multi-document stream
//! cargo run --bin crdgen > config/crd/aruba.yaml
//!
//! # A single kind
//! cargo run --bin crdgen -- --kind cloud-server | kubectl apply -f -
//! ```

use anyhow::{Context, Result};
use aruba_resource_operator::crd::{
    ArubaBlockStorage, ArubaCloudServer, ArubaKeyPair, ArubaNetworkElasticIp, ArubaProject,
    ArubaSecurityGroup, ArubaSecurityRule, ArubaSubnet, ArubaVpc,
};
use clap::{Parser, ValueEnum};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::CustomResourceExt;

/// Generate CRD YAML for the Aruba resource operator
#[derive(Debug, Parser)]
#[command(name = "crdgen")]
struct Cli {
    /// Only print this kind (repeatable); all kinds when omitted
    #[arg(short, long, value_enum)]
    kind: Vec<Kind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Project,
    Vpc,
    Subnet,
    SecurityGroup,
    SecurityRule,
    KeyPair,
    ElasticIp,
    BlockStorage,
    CloudServer,
}

impl Kind {
    fn crd(self) -> CustomResourceDefinition {
        match self {
            Kind::Project => ArubaProject::crd(),
            Kind::Vpc => ArubaVpc::crd(),
            Kind::Subnet => ArubaSubnet::crd(),
            Kind::SecurityGroup => ArubaSecurityGroup::crd(),
            Kind::SecurityRule => ArubaSecurityRule::crd(),
            Kind::KeyPair => ArubaKeyPair::crd(),
            Kind::ElasticIp => ArubaNetworkElasticIp::crd(),
            Kind::BlockStorage => ArubaBlockStorage::crd(),
            Kind::CloudServer => ArubaCloudServer::crd(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let kinds = if cli.kind.is_empty() {
        Kind::value_variants().to_vec()
    } else {
        cli.kind
    };

    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    for kind in kinds {
        let crd = kind.crd();
        let yaml = serde_yaml::to_string(&crd)
            .with_context(|| format!("Failed to serialize CRD {kind:?} to YAML"))?;
        println!("---");
        print!("{yaml}");
    }
    Ok(())
}
