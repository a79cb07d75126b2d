//! Order fulfillment routing
//!
//! An order carries three independent destination flags. Routing picks exactly
//! one [`Destination`] from them, and the supplier records a [`Dispatch`] whose
//! variant matches that destination.

use serde::{Deserialize, Serialize};

use crate::db::models::{ManageOrder, Order};

/// Downstream routing target of an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    DistributionCenter,
    Branch,
    AssociatedCompany,
}

impl Destination {
    /// Select the destination from an order's flags.
    ///
    /// Precedence is distribution center, then branch, then associated company.
    /// Returns `None` when no flag is set.
    pub fn from_flags(distribution_center: bool, branch: bool, associated_company: bool) -> Option<Self> {
        if distribution_center {
            Some(Destination::DistributionCenter)
        } else if branch {
            Some(Destination::Branch)
        } else if associated_company {
            Some(Destination::AssociatedCompany)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::DistributionCenter => "distribution_center",
            Destination::Branch => "branch",
            Destination::AssociatedCompany => "associated_company",
        }
    }

    /// Form fields the supplier has to fill in for this destination
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Destination::DistributionCenter => &["warehouse"],
            Destination::Branch => &["reference", "branch_code"],
            Destination::AssociatedCompany => &["reference", "branch_code", "details"],
        }
    }
}

/// Validated dispatch details, one variant per destination
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "destination", rename_all = "snake_case")]
pub enum Dispatch {
    DistributionCenter {
        warehouse: String,
    },
    Branch {
        reference: String,
        branch_code: i32,
    },
    AssociatedCompany {
        reference: String,
        branch_code: i32,
        details: String,
    },
}

/// Column values of a `manage_orders` row; fields a variant does not use stay empty
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchColumns {
    pub warehouse: String,
    pub reference: String,
    pub branch_code: Option<i32>,
    pub details: String,
}

impl Dispatch {
    pub fn destination(&self) -> Destination {
        match self {
            Dispatch::DistributionCenter { .. } => Destination::DistributionCenter,
            Dispatch::Branch { .. } => Destination::Branch,
            Dispatch::AssociatedCompany { .. } => Destination::AssociatedCompany,
        }
    }

    pub fn into_columns(self) -> DispatchColumns {
        match self {
            Dispatch::DistributionCenter { warehouse } => DispatchColumns {
                warehouse,
                ..Default::default()
            },
            Dispatch::Branch { reference, branch_code } => DispatchColumns {
                reference,
                branch_code: Some(branch_code),
                ..Default::default()
            },
            Dispatch::AssociatedCompany { reference, branch_code, details } => DispatchColumns {
                reference,
                branch_code: Some(branch_code),
                details,
                ..Default::default()
            },
        }
    }
}

/// Lifecycle position of a (client, item) pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// No order placed
    Unordered,
    /// Order placed without any destination flag; nothing to route yet
    Ordered,
    /// Order has a destination and awaits the supplier
    DispatchPending,
    /// Supplier recorded the dispatch
    Managed,
}

impl OrderState {
    pub fn of(order: Option<&Order>, fulfillment: Option<&ManageOrder>) -> Self {
        match (order, fulfillment) {
            (None, _) => OrderState::Unordered,
            (Some(_), Some(_)) => OrderState::Managed,
            (Some(order), None) if order.destination().is_some() => OrderState::DispatchPending,
            (Some(_), None) => OrderState::Ordered,
        }
    }
}
