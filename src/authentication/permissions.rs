use crate::{jwt::SessionData, schema::UserRole};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageOwnProfile,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageOwnProfile,
            ActionType::ManageAllRecipes,
            ActionType::ManageTags,
            ActionType::ManageIngredients,
            ActionType::ManageUsers,
        ],
    ),
];

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnCart,
    ManageOwnSubscriptions,
    ManageOwnProfile,

    ManageUsers,
    ManageAllRecipes,
    ManageTags,
    ManageIngredients,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        let user_uid = &session.user_uid;

        ACTION_TABLE
            .iter()
            .find_map(|(uid, actions)| {
                if user_uid != uid {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(uid: UserRole) -> SessionData {
        SessionData {
            user_id: 1,
            username: String::from("cook"),
            is_admin: uid == UserRole::Admin,
            user_uid: uid,
        }
    }

    #[test]
    fn plain_users_manage_only_their_own_things() {
        let s = session(UserRole::User);

        assert!(ActionType::CreateRecipes.authenticate(&s));
        assert!(ActionType::ManageOwnFavorites.authenticate(&s));
        assert!(!ActionType::ManageAllRecipes.authenticate(&s));
        assert!(!ActionType::ManageTags.authenticate(&s));
        assert!(!ActionType::ManageIngredients.authenticate(&s));
    }

    #[test]
    fn admins_hold_every_action() {
        let s = session(UserRole::Admin);

        assert!(ActionType::ManageAllRecipes.authenticate(&s));
        assert!(ActionType::ManageTags.authenticate(&s));
        assert!(ActionType::ManageUsers.authenticate(&s));
    }
}
