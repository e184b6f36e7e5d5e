//! # Variables 模块
//!
//! 变量显示协作者的接口与模块注册表。
//!
//! 核心只要求协作者实现 `initialize(args)` 与 `update(value)`；
//! 格式化、内容写入等逻辑完全属于模块自身。
//!
//! ## 元素声明
//!
//! ```text
//! <span id="score" class="js-variable" data-module="ReplaceContents"></span>
//! <img id="logo" class="js-variable" data-module="ChangeAttribute"
//!      data-module-args='{"src": "logos/{}.png"}'>
//! ```

mod modules;

pub use modules::{ChangeAttribute, ReplaceContents};

use std::collections::HashMap;

use serde_json::Value;

use crate::dom::ElementData;
use crate::error::SpecificationError;

/// 变量元素的样式标记
pub const VARIABLE_CLASS_SELECTOR: &str = "js-variable";

/// 模块名属性
pub const MODULE_ATTRIBUTE: &str = "data-module";

/// 模块参数属性（JSON）
pub const MODULE_ARGS_ATTRIBUTE: &str = "data-module-args";

/// 变量显示模块
pub trait VariableModule {
    /// 用元素声明的参数初始化模块（构建时调用一次）
    ///
    /// 返回 `Err` 时元素构建失败。
    fn initialize(&mut self, args: &Value) -> Result<(), String>;

    /// 把更新值渲染到元素上
    fn update(&mut self, target: &mut ElementData, value: &Value);
}

/// 模块工厂
pub type ModuleFactory = fn() -> Box<dyn VariableModule>;

/// 模块注册表：模块名 → 工厂
///
/// 在配置阶段填充，元素初始化时按名称解析一次。
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    factories: HashMap<String, ModuleFactory>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ModuleRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// 创建带内置模块的注册表
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("ReplaceContents", || Box::new(ReplaceContents));
        registry.register("ChangeAttribute", || Box::<ChangeAttribute>::default());
        registry
    }

    /// 注册模块（同名覆盖）
    pub fn register(&mut self, name: impl Into<String>, factory: ModuleFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// 按名称创建模块实例
    pub fn create(&self, name: &str) -> Option<Box<dyn VariableModule>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// 已注册的模块名（排序）
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// 变量控制器：一个变量元素与它的显示模块
pub struct VariableController {
    element: String,
    module_name: String,
    module: Box<dyn VariableModule>,
}

impl std::fmt::Debug for VariableController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableController")
            .field("element", &self.element)
            .field("module", &self.module_name)
            .finish()
    }
}

impl VariableController {
    /// 根据元素上的 `data-module` / `data-module-args` 构建
    pub fn from_element(
        data: &ElementData,
        registry: &ModuleRegistry,
    ) -> Result<Self, SpecificationError> {
        let element = data.element_id().to_string();

        let module_name = data
            .attributes
            .get(MODULE_ATTRIBUTE)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| SpecificationError::MissingAttribute {
                element: element.clone(),
                attribute: MODULE_ATTRIBUTE.to_string(),
            })?
            .clone();

        let args = match data.attributes.get(MODULE_ARGS_ATTRIBUTE) {
            Some(raw) => serde_json::from_str(raw).map_err(|e| SpecificationError::Malformed {
                element: element.clone(),
                message: format!("{MODULE_ARGS_ATTRIBUTE}: {e}"),
            })?,
            None => Value::Null,
        };

        let mut module =
            registry
                .create(&module_name)
                .ok_or_else(|| SpecificationError::UnknownModule {
                    element: element.clone(),
                    module: module_name.clone(),
                })?;
        module
            .initialize(&args)
            .map_err(|message| SpecificationError::ModuleInitialization {
                element: element.clone(),
                module: module_name.clone(),
                message,
            })?;

        Ok(Self {
            element,
            module_name,
            module,
        })
    }

    /// 元素 id
    pub fn element(&self) -> &str {
        &self.element
    }

    /// 模块名
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// 转发更新值
    pub fn update(&mut self, target: &mut ElementData, value: &Value) {
        self.module.update(target, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Fragment;

    struct Recorder;

    impl VariableModule for Recorder {
        fn initialize(&mut self, args: &Value) -> Result<(), String> {
            if args.get("fail").is_some() {
                return Err("requested failure".to_string());
            }
            Ok(())
        }

        fn update(&mut self, target: &mut ElementData, value: &Value) {
            target.text = format!("recorded {value}");
        }
    }

    fn element(attrs: &[(&str, &str)]) -> ElementData {
        let mut fragment = Fragment::new("span")
            .with_id("score")
            .with_class(VARIABLE_CLASS_SELECTOR);
        for (name, value) in attrs {
            fragment = fragment.with_attribute(name, value);
        }
        fragment.data
    }

    #[test]
    fn test_registry_builtins_and_custom() {
        let mut registry = ModuleRegistry::with_builtins();
        registry.register("Recorder", || Box::new(Recorder));
        assert_eq!(
            registry.names(),
            vec!["ChangeAttribute", "Recorder", "ReplaceContents"]
        );
        assert!(registry.create("Countdown").is_none());
    }

    #[test]
    fn test_controller_forwards_updates() {
        let mut registry = ModuleRegistry::new();
        registry.register("Recorder", || Box::new(Recorder));

        let mut data = element(&[(MODULE_ATTRIBUTE, "Recorder")]);
        let mut controller = VariableController::from_element(&data, &registry).unwrap();
        assert_eq!(controller.element(), "score");
        assert_eq!(controller.module_name(), "Recorder");

        controller.update(&mut data, &Value::from(5));
        assert_eq!(data.text, "recorded 5");
    }

    #[test]
    fn test_controller_errors() {
        let mut registry = ModuleRegistry::new();
        registry.register("Recorder", || Box::new(Recorder));

        let err = VariableController::from_element(&element(&[]), &registry).unwrap_err();
        assert!(matches!(err, SpecificationError::MissingAttribute { .. }));

        let err = VariableController::from_element(
            &element(&[(MODULE_ATTRIBUTE, "Countdown")]),
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, SpecificationError::UnknownModule { .. }));

        let err = VariableController::from_element(
            &element(&[(MODULE_ATTRIBUTE, "Recorder"), (MODULE_ARGS_ATTRIBUTE, "{bad")]),
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, SpecificationError::Malformed { .. }));

        let err = VariableController::from_element(
            &element(&[
                (MODULE_ATTRIBUTE, "Recorder"),
                (MODULE_ARGS_ATTRIBUTE, r#"{"fail": true}"#),
            ]),
            &registry,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SpecificationError::ModuleInitialization {
                element: "score".to_string(),
                module: "Recorder".to_string(),
                message: "requested failure".to_string(),
            }
        );
    }
}
