//! Lua sandbox creation
//!
//! Pipeline definitions are plain Lua files, so they are evaluated in a
//! restricted sandbox with no filesystem, process or module loading access.
//! The `slipway` helper table is always injected.

use mlua::{Lua, LuaOptions, Result as LuaResult, StdLib, Table, Value};

/// Create a restricted Lua sandbox for evaluating pipeline definitions
///
/// Only the table, string and math libraries are loaded. `require`,
/// `dofile` and `loadfile` are removed.
///
/// # Example
/// ```no_run
/// use slipway_lua::sandbox::create_sandbox;
///
/// let lua = create_sandbox()?;
/// let definition: mlua::Table = lua
///     .load(r#"return slipway.define { appName = "orders", appType = "springboot" }"#)
///     .eval()?;
/// let app_name: String = definition.get("appName")?;
/// assert_eq!(app_name, "orders");
/// # Ok::<(), mlua::Error>(())
/// ```
pub fn create_sandbox() -> LuaResult<Lua> {
    let lua = Lua::new_with(
        StdLib::TABLE | StdLib::STRING | StdLib::MATH,
        LuaOptions::default(),
    )?;

    lua.globals().set("require", mlua::Nil)?;
    lua.globals().set("dofile", mlua::Nil)?;
    lua.globals().set("loadfile", mlua::Nil)?;

    register_slipway_module(&lua)?;

    Ok(lua)
}

/// Register the `slipway` helper table
///
/// - `slipway.define(tbl)` returns the definition table as-is
/// - `slipway.app(name, type)` starts a builder with `:set(key, value)` and `:build()`
fn register_slipway_module(lua: &Lua) -> LuaResult<()> {
    let slipway = lua.create_table()?;

    let define_fn = lua.create_function(|_, definition: Table| Ok(definition))?;
    slipway.set("define", define_fn)?;

    let app_fn = lua.create_function(|lua, (name, app_type): (String, String)| {
        create_definition_builder(lua, name, app_type)
    })?;
    slipway.set("app", app_fn)?;

    lua.globals().set("slipway", slipway)?;

    Ok(())
}

/// Create a definition builder with fluent `set` and `build` methods
fn create_definition_builder(lua: &Lua, name: String, app_type: String) -> LuaResult<Table> {
    let builder = lua.create_table()?;
    let params = lua.create_table()?;
    params.set("appName", name)?;
    params.set("appType", app_type)?;
    builder.set("_params", params)?;

    let metatable = lua.create_table()?;

    let set_fn = lua.create_function(|_, (builder, key, value): (Table, String, Value)| {
        let params: Table = builder.get("_params")?;
        params.set(key, value)?;
        Ok(builder)
    })?;
    metatable.set("set", set_fn)?;

    let build_fn = lua.create_function(|lua, builder: Table| {
        let params: Table = builder.get("_params")?;
        let definition = lua.create_table()?;
        for pair in params.pairs::<Value, Value>() {
            let (key, value) = pair?;
            definition.set(key, value)?;
        }
        Ok(definition)
    })?;
    metatable.set("build", build_fn)?;

    metatable.set("__index", metatable.clone())?;
    builder.set_metatable(Some(metatable))?;

    Ok(builder)
}
