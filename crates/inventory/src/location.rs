//! Creating internal stock locations, and checking whether the session user
//! may manage inventory at all.
//!
//! New locations are placed under a parent found by [`ResolveParentLocation`]:
//! the internal location named `Stock`, else any internal location.

use std::fmt;

use serde_json::{Map, Value};
use tracing::{info, warn};

use erplink_core::{CallOptions, RecordExt, RemoteId, RemoteResult, SearchDomain};
use erplink_executor::{AdaptiveExecutor, AttemptError, AttemptResult, OperationIntent, Strategy};
use erplink_rpc::{Gateway, Session};

use crate::error::InventoryError;
use crate::warehouse::{LOCATION_MODEL, StockLocation};

const DEFAULT_PARENT_NAME: &str = "Stock";
const INTERNAL_USAGE: &str = "internal";
const READ_BACK_FIELDS: [&str; 5] = ["id", "name", "complete_name", "location_id", "usage"];

const USER_MODEL: &str = "res.users";
const GROUP_MODEL: &str = "res.groups";
const INVENTORY_CATEGORY: &str = "Inventory";
const MANAGER_MARKERS: [&str; 2] = ["manager", "admin"];

/// The location new locations are created under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLocation {
    pub id: RemoteId,
    pub name: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ResolveParentLocation;

impl ResolveParentLocation {
    fn first_internal<G: Gateway>(
        session: &Session<G>,
        named: Option<&str>,
    ) -> AttemptResult<ParentLocation> {
        let mut domain = SearchDomain::all();
        if let Some(name) = named {
            domain = domain.eq("name", name);
        }
        let domain = domain.eq("usage", INTERNAL_USAGE);
        let fields = session.known_fields(LOCATION_MODEL, &["id", "name", "complete_name"])?;
        let rows = session.search_read(
            LOCATION_MODEL,
            &domain,
            &CallOptions::new().fields(fields).limit(1),
        )?;

        let found = rows.first().and_then(|row| {
            Some(ParentLocation {
                id: row.id()?,
                name: row
                    .text("complete_name")
                    .or_else(|| row.text("name"))
                    .unwrap_or_default()
                    .to_string(),
            })
        });
        found.ok_or_else(|| match named {
            Some(name) => AttemptError::declined(format!("no internal location named {name}")),
            None => AttemptError::declined("no internal location"),
        })
    }
}

impl OperationIntent for ResolveParentLocation {
    type Output = ParentLocation;

    fn name(&self) -> &'static str {
        "resolve-parent-location"
    }

    fn candidate_models(&self) -> Vec<&'static str> {
        vec![LOCATION_MODEL]
    }

    fn strategies<'a, G: Gateway + 'a>(&'a self) -> Vec<Strategy<'a, G, ParentLocation>> {
        vec![
            Strategy::new("named-stock-location", |s| {
                Self::first_internal(s, Some(DEFAULT_PARENT_NAME))
            })
            .requires(LOCATION_MODEL),
            Strategy::new("any-internal-location", |s| Self::first_internal(s, None))
                .requires(LOCATION_MODEL),
        ]
    }
}

fn resolve_parent<G: Gateway>(session: &Session<G>) -> Result<ParentLocation, InventoryError> {
    let parent = AdaptiveExecutor::new(session)
        .run(&ResolveParentLocation)?
        .into_value()
        .ok_or(InventoryError::NoParentLocation)?;
    info!(parent = %parent.id, name = %parent.name, "using parent location");
    Ok(parent)
}

/// A location created by [`create_stock_location`] or [`create_locations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedLocation {
    pub id: RemoteId,
    pub name: String,
    pub parent: ParentLocation,
    /// The location as read back; `None` when the read-back failed.
    pub record: Option<StockLocation>,
}

impl fmt::Display for CreatedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created location {} with ID: {}", self.name, self.id)?;
        write!(f, "Parent Location: {} (ID: {})", self.parent.name, self.parent.id)?;
        match &self.record {
            Some(record) => write!(
                f,
                "\nComplete Path: {}\nUsage: {}",
                record.name,
                record.usage.as_deref().unwrap_or("N/A")
            ),
            None => write!(f, "\n(location details could not be read back)"),
        }
    }
}

/// Create one internal location under the resolved parent.
pub fn create_stock_location<G: Gateway>(
    session: &Session<G>,
    name: &str,
) -> Result<CreatedLocation, InventoryError> {
    let name = valid_name(name)?;
    let parent = resolve_parent(session)?;
    create_under(session, name, &parent)
}

fn valid_name(name: &str) -> Result<&str, InventoryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(InventoryError::InvalidLocationName(name.to_string()));
    }
    Ok(trimmed)
}

fn create_under<G: Gateway>(
    session: &Session<G>,
    name: &str,
    parent: &ParentLocation,
) -> Result<CreatedLocation, InventoryError> {
    let mut values = Map::new();
    values.insert("name".into(), Value::from(name));
    values.insert("usage".into(), Value::from(INTERNAL_USAGE));
    values.insert("location_id".into(), Value::from(parent.id));
    info!(name, parent = %parent.id, "creating stock location");

    let id = session
        .create(LOCATION_MODEL, values)
        .map_err(|fault| match fault {
            f if f.is_fatal() => InventoryError::Remote(f),
            f => InventoryError::LocationRejected {
                name: name.to_string(),
                fault: f,
            },
        })?;
    info!(id = %id, name, "stock location created");

    let record = match read_location(session, id) {
        Ok(record) => record,
        Err(fault) => {
            warn!(id = %id, error = %fault, "could not read back created location");
            None
        }
    };
    Ok(CreatedLocation {
        id,
        name: name.to_string(),
        parent: parent.clone(),
        record,
    })
}

fn read_location<G: Gateway>(
    session: &Session<G>,
    id: RemoteId,
) -> RemoteResult<Option<StockLocation>> {
    let fields = session.known_fields(LOCATION_MODEL, &READ_BACK_FIELDS)?;
    let rows = session.read(LOCATION_MODEL, &[id], &fields)?;
    Ok(rows.first().and_then(StockLocation::from_record))
}

/// Result of [`create_locations`]: what was created and what was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationBatch {
    pub parent: ParentLocation,
    pub created: Vec<CreatedLocation>,
    pub failed: Vec<(String, InventoryError)>,
}

impl fmt::Display for LocationBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.created.is_empty() {
            write!(f, "No locations were successfully created.")?;
        } else {
            write!(f, "Summary of created locations:")?;
            for location in &self.created {
                write!(f, "\n - {} (ID: {})", location.name, location.id)?;
            }
        }
        for (name, error) in &self.failed {
            write!(f, "\n ! {name}: {error}")?;
        }
        Ok(())
    }
}

/// Create every named location under one parent.
///
/// A location the remote refuses is recorded in [`LocationBatch::failed`]
/// and the rest are still attempted; transport and auth faults stop the batch.
pub fn create_locations<G: Gateway, S: AsRef<str>>(
    session: &Session<G>,
    names: &[S],
) -> Result<LocationBatch, InventoryError> {
    let parent = resolve_parent(session)?;
    let mut created = Vec::new();
    let mut failed = Vec::new();
    for name in names {
        let name = name.as_ref();
        match valid_name(name).and_then(|valid| create_under(session, valid, &parent)) {
            Ok(location) => created.push(location),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(name, error = %err, "stock location not created");
                failed.push((name.to_string(), err));
            }
        }
    }
    info!(created = created.len(), failed = failed.len(), "stock locations processed");
    Ok(LocationBatch {
        parent,
        created,
        failed,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryGroup {
    pub id: RemoteId,
    pub name: String,
}

/// Whether the session user belongs to an Inventory manager/admin group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCheck {
    pub user: String,
    pub has_manager_rights: bool,
    /// The install's Inventory manager/admin groups.
    pub manager_groups: Vec<InventoryGroup>,
}

impl fmt::Display for PermissionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Logged in as: {}", self.user)?;
        if self.has_manager_rights {
            return write!(f, "User has inventory management permissions.");
        }
        write!(
            f,
            "WARNING: User may not have sufficient permissions for warehouse management."
        )?;
        if !self.manager_groups.is_empty() {
            write!(f, "\nInventory manager groups:")?;
            for group in &self.manager_groups {
                write!(f, "\n - {} (ID: {})", group.name, group.id)?;
            }
        }
        Ok(())
    }
}

pub fn check_permissions<G: Gateway>(
    session: &Session<G>,
) -> Result<PermissionCheck, InventoryError> {
    let user_fields = session.known_fields(USER_MODEL, &["name", "groups_id"])?;
    let users = session.read(USER_MODEL, &[session.uid()], &user_fields)?;
    let user = users.first();
    let user_name = user
        .and_then(|u| u.text("name"))
        .unwrap_or("unknown")
        .to_string();
    let user_groups: Vec<RemoteId> = user
        .and_then(|u| u.get("groups_id"))
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(RemoteId::from_value).collect())
        .unwrap_or_default();

    let group_fields = session.known_fields(GROUP_MODEL, &["id", "name", "category_id"])?;
    let rows = session.search_read(
        GROUP_MODEL,
        &SearchDomain::all(),
        &CallOptions::new().fields(group_fields),
    )?;
    let manager_groups: Vec<InventoryGroup> = rows
        .iter()
        .filter(|row| {
            row.reference("category_id")
                .is_some_and(|category| category.name == INVENTORY_CATEGORY)
        })
        .filter_map(|row| {
            let name = row.text("name")?;
            let lower = name.to_lowercase();
            if !MANAGER_MARKERS.iter().any(|marker| lower.contains(marker)) {
                return None;
            }
            Some(InventoryGroup {
                id: row.id()?,
                name: name.to_string(),
            })
        })
        .collect();

    let has_manager_rights = manager_groups.iter().any(|g| user_groups.contains(&g.id));
    info!(user = %user_name, has_manager_rights, "checked inventory permissions");
    Ok(PermissionCheck {
        user: user_name,
        has_manager_rights,
        manager_groups,
    })
}
