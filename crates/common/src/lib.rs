//! Shared building blocks for the CMS workspace: logging setup, runtime
//! directory checks, pagination and small wire types.

pub mod types;
pub mod utils;
pub mod pagination;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
        let v = serde_json::to_value(&h).unwrap();
        assert_eq!(v["status"], "ok");
    }
}
