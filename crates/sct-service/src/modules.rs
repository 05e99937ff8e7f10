//! Module dependency reporting.

use chrono::NaiveDate;
use sct_types::{well_known, SctId};

use crate::error::ServiceResult;
use crate::service::Service;

/// One edge of the module dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDependency {
    /// The depending module.
    pub module_id: SctId,
    /// The module depended on.
    pub target_module_id: SctId,
    /// Version of the depending module.
    pub source_effective_time: Option<NaiveDate>,
    /// Required version of the target module.
    pub target_effective_time: Option<NaiveDate>,
    /// Installed version of the target module, imputed for the model
    /// module from the core module's version.
    pub installed_effective_time: Option<NaiveDate>,
    /// True when the required target version is satisfied.
    pub valid: bool,
}

impl Service {
    /// The module dependency graph from the module dependency refset.
    ///
    /// An edge is valid when the required target version is not newer
    /// than the installed version of that module. The model module's
    /// installed version imputes to the core module's version, matching
    /// distribution practice where the model module is versioned with
    /// the core content.
    pub fn module_dependencies(&self) -> ServiceResult<Vec<ModuleDependency>> {
        let installed = self.store().module_versions()?;
        let installed_version = |module: SctId| -> Option<NaiveDate> {
            if module == well_known::MODEL_MODULE {
                return installed
                    .get(&well_known::CORE_MODULE)
                    .or_else(|| installed.get(&well_known::MODEL_MODULE))
                    .copied();
            }
            installed.get(&module).copied()
        };

        let query = self
            .members_searcher()
            .q_refset_id(well_known::MODULE_DEPENDENCY_REFSET)?;
        let targets = self.members_searcher().referenced_components(query.as_ref())?;

        let mut out = Vec::new();
        for target_module in targets {
            for item in self
                .store()
                .items_for_refset(target_module, well_known::MODULE_DEPENDENCY_REFSET)?
            {
                let target_required = item.target_effective_time();
                let target_installed = installed_version(target_module);
                let valid = match (target_required, target_installed) {
                    (Some(required), Some(actual)) => required <= actual,
                    _ => false,
                };
                out.push(ModuleDependency {
                    module_id: item.module_id,
                    target_module_id: target_module,
                    source_effective_time: item.source_effective_time(),
                    target_effective_time: target_required,
                    installed_effective_time: target_installed,
                    valid,
                });
            }
        }
        out.sort_by_key(|d| (d.module_id, d.target_module_id));
        Ok(out)
    }
}
