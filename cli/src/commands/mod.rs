mod backup;
mod helpers;
mod ingredient;
mod purchase;
mod recipe;

pub(crate) use backup::{cmd_export, cmd_import};
pub(crate) use ingredient::{
    cmd_ingredient_add, cmd_ingredient_delete, cmd_ingredient_list, cmd_ingredient_show,
    cmd_ingredient_update,
};
pub(crate) use purchase::cmd_purchase;
pub(crate) use recipe::{
    cmd_recipe_add, cmd_recipe_delete, cmd_recipe_list, cmd_recipe_show, cmd_recipe_update,
};
