//! Foreign AST builder reached through C function pointers
//!
//! Every node event becomes an `enter_node`/`leave_node` pair. A callback
//! returning non-zero rejects the event; a missing required callback is a
//! linkage failure.

use jtrav_core::bridge::{AstBuilder, BuilderError};
use jtrav_core::frontend::ast::{
    EnumConstantDecl, Expression, FieldDecl, ImportDecl, InitializerDecl, MethodDecl,
    PackageDecl, Statement, StatementKind, TypeDecl,
};
use jtrav_core::frontend::LanguageLevel;
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

pub type BatchCallback = Option<unsafe extern "C" fn(user_data: *mut c_void) -> c_int>;

/// Receives a file name; for `is_specified_source_file`, negative means "no opinion"
pub type FileCallback =
    Option<unsafe extern "C" fn(user_data: *mut c_void, file_name: *const c_char) -> c_int>;

/// `name` and `detail` may be null
pub type EnterNodeCallback = Option<
    unsafe extern "C" fn(
        user_data: *mut c_void,
        kind: *const c_char,
        name: *const c_char,
        detail: *const c_char,
        line: c_int,
    ) -> c_int,
>;

pub type LeaveNodeCallback =
    Option<unsafe extern "C" fn(user_data: *mut c_void, kind: *const c_char) -> c_int>;

/// Callback table supplied by the host
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JtravAstCallbacks {
    pub user_data: *mut c_void,
    pub begin_batch: BatchCallback,
    pub end_batch: BatchCallback,
    pub enter_node: EnterNodeCallback,
    pub leave_node: LeaveNodeCallback,
    pub is_specified_source_file: FileCallback,
    pub abort_unit: FileCallback,
}

impl Default for JtravAstCallbacks {
    fn default() -> Self {
        Self {
            user_data: ptr::null_mut(),
            begin_batch: None,
            end_batch: None,
            enter_node: None,
            leave_node: None,
            is_specified_source_file: None,
            abort_unit: None,
        }
    }
}

/// [`AstBuilder`] over a host callback table
pub struct CallbackAstBuilder {
    callbacks: JtravAstCallbacks,
    open_kinds: Vec<&'static str>,
}

impl CallbackAstBuilder {
    /// # Safety
    /// Every non-null function pointer must be callable with `user_data`
    /// for as long as the builder lives.
    pub unsafe fn new(callbacks: JtravAstCallbacks) -> Self {
        Self {
            callbacks,
            open_kinds: Vec::new(),
        }
    }

    fn missing(entry_point: &str) -> BuilderError {
        BuilderError::Linkage {
            entry_point: entry_point.to_string(),
        }
    }

    fn check(status: c_int, node: &str) -> Result<(), BuilderError> {
        if status == 0 {
            Ok(())
        } else {
            Err(BuilderError::rejected(
                node,
                &format!("host returned status {}", status),
            ))
        }
    }

    fn c_string(value: &str, node: &str) -> Result<CString, BuilderError> {
        CString::new(value).map_err(|_| BuilderError::rejected(node, "interior NUL byte"))
    }

    fn enter(
        &mut self,
        kind: &str,
        name: Option<&str>,
        detail: Option<&str>,
        line: u32,
    ) -> Result<(), BuilderError> {
        let callback = self.callbacks.enter_node.ok_or_else(|| Self::missing("enter_node"))?;
        let kind_c = Self::c_string(kind, kind)?;
        let name_c = name.map(|n| Self::c_string(n, kind)).transpose()?;
        let detail_c = detail.map(|d| Self::c_string(d, kind)).transpose()?;

        // SAFETY: the table's contract is established in `new`; the strings outlive the call
        let status = unsafe {
            callback(
                self.callbacks.user_data,
                kind_c.as_ptr(),
                name_c.as_ref().map_or(ptr::null(), |c| c.as_ptr()),
                detail_c.as_ref().map_or(ptr::null(), |c| c.as_ptr()),
                c_int::try_from(line).unwrap_or(c_int::MAX),
            )
        };
        Self::check(status, kind)
    }

    fn leave(&mut self, kind: &str) -> Result<(), BuilderError> {
        let callback = self.callbacks.leave_node.ok_or_else(|| Self::missing("leave_node"))?;
        let kind_c = Self::c_string(kind, kind)?;
        // SAFETY: see `enter`
        let status = unsafe { callback(self.callbacks.user_data, kind_c.as_ptr()) };
        Self::check(status, kind)
    }

    fn leaf(
        &mut self,
        kind: &str,
        name: Option<&str>,
        detail: Option<&str>,
        line: u32,
    ) -> Result<(), BuilderError> {
        self.enter(kind, name, detail, line)?;
        self.leave(kind)
    }
}

impl AstBuilder for CallbackAstBuilder {
    fn begin_batch(&mut self) -> Result<(), BuilderError> {
        let callback = self.callbacks.begin_batch.ok_or_else(|| Self::missing("begin_batch"))?;
        // SAFETY: see `enter`
        Self::check(unsafe { callback(self.callbacks.user_data) }, "batch")
    }

    fn end_batch(&mut self) -> Result<(), BuilderError> {
        let callback = self.callbacks.end_batch.ok_or_else(|| Self::missing("end_batch"))?;
        // SAFETY: see `enter`
        Self::check(unsafe { callback(self.callbacks.user_data) }, "batch")
    }

    fn is_specified_source_file(&mut self, file_name: &str) -> Option<bool> {
        let callback = self.callbacks.is_specified_source_file?;
        let file_c = CString::new(file_name).ok()?;
        // SAFETY: see `enter`
        let answer = unsafe { callback(self.callbacks.user_data, file_c.as_ptr()) };
        (answer >= 0).then_some(answer > 0)
    }

    fn abort_compilation_unit(&mut self, file_name: &str) {
        self.open_kinds.clear();
        let (Some(callback), Ok(file_c)) = (self.callbacks.abort_unit, CString::new(file_name))
        else {
            return;
        };
        // SAFETY: see `enter`
        unsafe {
            callback(self.callbacks.user_data, file_c.as_ptr());
        }
    }

    fn enter_compilation_unit(
        &mut self,
        file_name: &str,
        package: Option<&str>,
        level: LanguageLevel,
    ) -> Result<(), BuilderError> {
        let detail = match package {
            Some(package) => format!("{} {}", level.tag(), package),
            None => level.tag().to_string(),
        };
        self.enter("compilation_unit", Some(file_name), Some(&detail), 1)
    }

    fn leave_compilation_unit(&mut self, _file_name: &str) -> Result<(), BuilderError> {
        self.leave("compilation_unit")
    }

    fn package(&mut self, decl: &PackageDecl) -> Result<(), BuilderError> {
        self.leaf("package", Some(&decl.name), None, decl.span.start.line)
    }

    fn import(&mut self, decl: &ImportDecl) -> Result<(), BuilderError> {
        let detail = match (decl.is_static, decl.on_demand) {
            (true, true) => Some("static on_demand"),
            (true, false) => Some("static"),
            (false, true) => Some("on_demand"),
            (false, false) => None,
        };
        self.leaf("import", Some(&decl.name), detail, decl.span.start.line)
    }

    fn enter_type(&mut self, decl: &TypeDecl) -> Result<(), BuilderError> {
        let modifiers = decl.modifiers.join(" ");
        self.enter(
            decl.kind.as_str(),
            Some(&decl.name),
            (!modifiers.is_empty()).then_some(modifiers.as_str()),
            decl.span.start.line,
        )?;
        self.open_kinds.push(decl.kind.as_str());
        Ok(())
    }

    fn leave_type(&mut self, _name: &str) -> Result<(), BuilderError> {
        let kind = self.open_kinds.pop().unwrap_or("class");
        self.leave(kind)
    }

    fn field(&mut self, decl: &FieldDecl) -> Result<(), BuilderError> {
        for variable in &decl.variables {
            self.enter(
                "field",
                Some(&variable.name),
                Some(&decl.type_name),
                variable.span.start.line,
            )?;
            if let Some(init) = &variable.initializer {
                self.expression(init)?;
            }
            self.leave("field")?;
        }
        Ok(())
    }

    fn enum_constant(&mut self, decl: &EnumConstantDecl) -> Result<(), BuilderError> {
        self.enter("enum_constant", Some(&decl.name), None, decl.span.start.line)?;
        for argument in &decl.arguments {
            self.expression(argument)?;
        }
        self.leave("enum_constant")
    }

    fn enter_method(&mut self, decl: &MethodDecl) -> Result<(), BuilderError> {
        let kind = if decl.is_constructor() {
            "constructor"
        } else {
            "method"
        };
        self.enter(kind, Some(&decl.name), decl.return_type.as_deref(), decl.span.start.line)?;
        self.open_kinds.push(kind);
        for parameter in &decl.parameters {
            self.leaf(
                "parameter",
                Some(&parameter.name),
                Some(&parameter.type_name),
                decl.span.start.line,
            )?;
        }
        Ok(())
    }

    fn leave_method(&mut self, _name: &str) -> Result<(), BuilderError> {
        let kind = self.open_kinds.pop().unwrap_or("method");
        self.leave(kind)
    }

    fn enter_initializer(&mut self, decl: &InitializerDecl) -> Result<(), BuilderError> {
        let detail = if decl.is_static { "static" } else { "instance" };
        self.enter("initializer", None, Some(detail), decl.span.start.line)
    }

    fn leave_initializer(&mut self) -> Result<(), BuilderError> {
        self.leave("initializer")
    }

    fn enter_statement(&mut self, statement: &Statement) -> Result<(), BuilderError> {
        self.enter(
            statement.kind.as_str(),
            statement.label.as_deref(),
            None,
            statement.span.start.line,
        )
    }

    fn leave_statement(&mut self, kind: StatementKind) -> Result<(), BuilderError> {
        self.leave(kind.as_str())
    }

    fn expression(&mut self, expression: &Expression) -> Result<(), BuilderError> {
        self.leaf(
            expression.kind.as_str(),
            None,
            Some(&expression.text),
            expression.span.start.line,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::ffi::CStr;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        reject_kind: Option<&'static str>,
    }

    unsafe extern "C" fn record_enter(
        user_data: *mut c_void,
        kind: *const c_char,
        name: *const c_char,
        _detail: *const c_char,
        line: c_int,
    ) -> c_int {
        let recorder = &mut *(user_data as *mut Recorder);
        let kind = CStr::from_ptr(kind).to_string_lossy().into_owned();
        let name = if name.is_null() {
            String::new()
        } else {
            CStr::from_ptr(name).to_string_lossy().into_owned()
        };
        let rejected = recorder.reject_kind == Some(kind.as_str());
        recorder.events.push(format!("+{}:{}@{}", kind, name, line));
        c_int::from(rejected)
    }

    unsafe extern "C" fn record_leave(user_data: *mut c_void, kind: *const c_char) -> c_int {
        let recorder = &mut *(user_data as *mut Recorder);
        recorder
            .events
            .push(format!("-{}", CStr::from_ptr(kind).to_string_lossy()));
        0
    }

    unsafe extern "C" fn only_main(_user_data: *mut c_void, file: *const c_char) -> c_int {
        let file = CStr::from_ptr(file).to_string_lossy();
        if file.ends_with("Main.java") {
            1
        } else {
            -1
        }
    }

    fn table(recorder: &mut Recorder) -> JtravAstCallbacks {
        JtravAstCallbacks {
            user_data: recorder as *mut Recorder as *mut c_void,
            enter_node: Some(record_enter),
            leave_node: Some(record_leave),
            is_specified_source_file: Some(only_main),
            ..Default::default()
        }
    }

    #[test]
    fn test_events_become_enter_leave_pairs() {
        let mut recorder = Recorder::default();
        let mut builder = unsafe { CallbackAstBuilder::new(table(&mut recorder)) };

        builder
            .enter_compilation_unit("Main.java", Some("p"), LanguageLevel::Jdk1_8)
            .unwrap();
        builder
            .package(&PackageDecl {
                name: "p".to_string(),
                span: Default::default(),
            })
            .unwrap();
        builder.leave_compilation_unit("Main.java").unwrap();
        drop(builder);

        assert_eq!(
            recorder.events,
            vec!["+compilation_unit:Main.java@1", "+package:p@0", "-package", "-compilation_unit"]
        );
    }

    #[test]
    fn test_missing_callbacks_are_linkage_failures() {
        let mut recorder = Recorder::default();
        let mut builder = unsafe { CallbackAstBuilder::new(table(&mut recorder)) };

        assert_matches!(
            builder.begin_batch(),
            Err(BuilderError::Linkage { entry_point }) if entry_point == "begin_batch"
        );

        let mut empty = unsafe { CallbackAstBuilder::new(JtravAstCallbacks::default()) };
        assert_matches!(
            empty.enter_compilation_unit("A.java", None, LanguageLevel::Jdk1_8),
            Err(BuilderError::Linkage { .. })
        );
        assert_eq!(empty.is_specified_source_file("A.java"), None);
    }

    #[test]
    fn test_non_zero_status_rejects() {
        let mut recorder = Recorder {
            reject_kind: Some("package"),
            ..Default::default()
        };
        let mut builder = unsafe { CallbackAstBuilder::new(table(&mut recorder)) };

        assert_matches!(
            builder.package(&PackageDecl {
                name: "p".to_string(),
                span: Default::default(),
            }),
            Err(BuilderError::Rejected { node, .. }) if node == "package"
        );
    }

    #[test]
    fn test_specified_source_file_answers() {
        let mut recorder = Recorder::default();
        let mut builder = unsafe { CallbackAstBuilder::new(table(&mut recorder)) };

        assert_eq!(builder.is_specified_source_file("src/Main.java"), Some(true));
        assert_eq!(builder.is_specified_source_file("src/Other.java"), None);
    }
}
