use strum_macros::{Display, EnumString};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    SuperAdmin = 1,
    Admin = 2,
    Teacher = 3,
    Student = 4,
    Parent = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::SuperAdmin),
            2 => Some(Role::Admin),
            3 => Some(Role::Teacher),
            4 => Some(Role::Student),
            5 => Some(Role::Parent),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn id_round_trip() {
        for id in 1..=5u8 {
            let role = Role::from_id(id).unwrap();
            assert_eq!(role.id(), id);
        }
        assert!(Role::from_id(0).is_none());
        assert!(Role::from_id(6).is_none());
    }

    #[test]
    fn wire_names() {
        assert_eq!(Role::SuperAdmin.to_string(), "superadmin");
        assert_eq!(Role::from_str("teacher").unwrap(), Role::Teacher);
        assert_eq!(Role::from_str("parent").unwrap(), Role::Parent);
        assert!(Role::from_str("janitor").is_err());
    }
}
