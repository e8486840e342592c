//! Declarative capability policy.
//!
//! Every externally reachable operation maps to one [`Capability`], and every
//! capability names the role allowed to perform it. Handlers run exactly one
//! `authorize` call at the top instead of repeating ad-hoc role checks.
//! Ownership predicates (a store touching its own order) stay with the
//! services, which scope queries by tenant.

use crate::errors::ServiceError;

use super::{AuthUser, Role};

/// Operation signatures exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    // Cart Manager
    ManageCart,

    // Order lifecycle
    PlaceOrder,
    ListOwnOrders,
    ListAllOrders,
    ReadOrder,
    ConfirmOrder,
    CancelOrder,
    UpdateShippingStatus,
    UpdateOrderPaymentStatus,
    ConfirmOrderReceived,

    // Payment lifecycle
    InitiatePayment,
    SubmitTransaction,
    VerifyPayment,
    ReadPayment,
    ReadReceipt,

    // Address book
    ManageAddresses,

    // Catalog and tenancy administration
    ManageProducts,
    ReadOwnProducts,
    ManageStores,
    ReadOwnStoreProfile,
    ManageCompanies,

    // Projections
    ReadDashboard,
}

/// Role requirement for a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    Admin,
    Store,
    AdminOrStore,
}

impl Capability {
    pub fn required_role(self) -> RoleRequirement {
        use Capability::*;
        match self {
            ManageCart | PlaceOrder | ListOwnOrders | ConfirmOrderReceived | SubmitTransaction
            | ManageAddresses | ReadOwnProducts | ReadOwnStoreProfile => RoleRequirement::Store,

            ListAllOrders | ConfirmOrder | CancelOrder | UpdateShippingStatus
            | UpdateOrderPaymentStatus | InitiatePayment | VerifyPayment | ManageProducts
            | ManageStores | ManageCompanies => RoleRequirement::Admin,

            ReadOrder | ReadPayment | ReadReceipt | ReadDashboard => RoleRequirement::AdminOrStore,
        }
    }
}

impl AuthUser {
    /// Checks that this caller's role satisfies the capability.
    pub fn authorize(&self, capability: Capability) -> Result<(), ServiceError> {
        let allowed = match capability.required_role() {
            RoleRequirement::Admin => self.role == Role::Admin,
            RoleRequirement::Store => self.role == Role::Store,
            RoleRequirement::AdminOrStore => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "role {} may not perform this operation",
                self.role
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role,
            name: "caller".into(),
            email: "caller@example.com".into(),
        }
    }

    #[test]
    fn admin_cannot_touch_carts() {
        let admin = caller(Role::Admin);
        assert!(admin.authorize(Capability::ManageCart).is_err());
        assert!(admin.authorize(Capability::ConfirmOrder).is_ok());
    }

    #[test]
    fn store_cannot_confirm_orders() {
        let store = caller(Role::Store);
        assert!(store.authorize(Capability::ConfirmOrder).is_err());
        assert!(store.authorize(Capability::VerifyPayment).is_err());
        assert!(store.authorize(Capability::ManageCart).is_ok());
        assert!(store.authorize(Capability::SubmitTransaction).is_ok());
    }

    #[test]
    fn reads_are_open_to_both_roles() {
        assert!(caller(Role::Admin).authorize(Capability::ReadOrder).is_ok());
        assert!(caller(Role::Store).authorize(Capability::ReadOrder).is_ok());
        assert!(caller(Role::Store).authorize(Capability::ReadReceipt).is_ok());
    }
}
