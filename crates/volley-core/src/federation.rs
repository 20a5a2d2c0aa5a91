use crate::errors::FederationError;
use crate::interaction::DiscoveredObject;

/// Object class the RTI uses to describe joined federates.
pub const FEDERATE_OBJECT_CLASS: &str = "HLAmanager.HLAfederate";

/// Federate name attribute of [`FEDERATE_OBJECT_CLASS`].
pub const FEDERATE_NAME_ATTRIBUTE: &str = "HLAfederateName";

/// Federate type attribute of [`FEDERATE_OBJECT_CLASS`].
pub const FEDERATE_TYPE_ATTRIBUTE: &str = "HLAfederateType";

/// FOM module list attribute of [`FEDERATE_OBJECT_CLASS`].
pub const FOM_MODULES_ATTRIBUTE: &str = "HLAFOMmoduleDesignatorList";

/// Object class of munition instances.
pub const MUNITION_OBJECT_CLASS: &str = "BaseEntity.PhysicalEntity.Munition";

/// Requests the verdict engine makes of the federation.
///
/// Implementations forward to an RTI connection or to a recorded capture.
/// Errors are environmental and never blame the SuT.
pub trait Federation: Send + Sync {
    /// Whether a federate with this name is currently joined.
    fn is_federate_joined(&self, federate_name: &str) -> Result<bool, FederationError>;

    /// Asks the owner of an object instance to send current attribute values.
    fn request_attribute_update(
        &self,
        object: &DiscoveredObject,
        attributes: &[String],
    ) -> Result<(), FederationError>;
}
