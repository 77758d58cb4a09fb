//! Mail manager implementation using minijinja.

use crate::{
    context::InvitationContext,
    engine::{MailEngine, RenderedInvitation},
    error::{MailError, Result},
};
use serde::Serialize;
use std::path::PathBuf;

const BUILTIN_TEMPLATES: [(&str, &str); 2] = [
    (
        "invitacion_persona.j2",
        include_str!("../templates/invitacion_persona.j2"),
    ),
    (
        "invitacion_organizacion.j2",
        include_str!("../templates/invitacion_organizacion.j2"),
    ),
];

const SUBJECT_TEMPLATE: &str = "{% if entity == 'organizacion' %}Invitación para administrar la ficha de {{ recipient_name }}{% else %}Invitación para reclamar tu perfil en la comunidad CET{% endif %}";

/// Manager for loading and rendering invitation templates.
///
/// Uses the templates bundled with the crate unless an override directory
/// of `.j2` files is given.
///
/// # Examples
///
/// ```
/// use cetdir_mail::{MailEngine, MailManager};
///
/// let manager = MailManager::builtin()?;
/// let names = manager.list_templates()?;
/// assert_eq!(names, vec!["invitacion_organizacion", "invitacion_persona"]);
/// # Ok::<(), cetdir_mail::MailError>(())
/// ```
#[derive(Debug)]
pub struct MailManager {
    /// Override directory, `None` for the built-in templates.
    pub templates_dir: Option<PathBuf>,
    env: minijinja::Environment<'static>,
}

impl MailManager {
    /// Creates a manager backed by the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns `MailError::TemplateRenderError` if a bundled template fails to compile.
    pub fn builtin() -> Result<Self> {
        let mut env = minijinja::Environment::new();
        for (name, source) in BUILTIN_TEMPLATES {
            env.add_template(name, source)
                .map_err(|e| MailError::TemplateRenderError(format!("{name}: {e}")))?;
        }

        Ok(Self {
            templates_dir: None,
            env,
        })
    }

    /// Creates a manager loading `.j2` templates from `templates_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory does not exist or is not a directory.
    pub fn new(templates_dir: PathBuf) -> Result<Self> {
        if !templates_dir.is_dir() {
            return Err(MailError::TemplateDirectoryNotFound(templates_dir));
        }

        let mut env = minijinja::Environment::new();
        env.set_loader(minijinja::path_loader(&templates_dir));

        Ok(Self {
            templates_dir: Some(templates_dir),
            env,
        })
    }

    fn load_template(&self, name: &str) -> Result<minijinja::Template<'_, '_>> {
        self.env
            .get_template(&name_with_ext(name))
            .map_err(|e| MailError::TemplateNotFound(format!("{name}: {e}")))
    }
}

impl MailEngine for MailManager {
    fn render<T: Serialize>(&self, template: &str, ctx: &T) -> Result<String> {
        let tmpl = self.load_template(template)?;
        tmpl.render(ctx)
            .map_err(|e| MailError::TemplateRenderError(format!("{template}: {e}")))
    }

    fn render_invitation(&self, ctx: &InvitationContext) -> Result<RenderedInvitation> {
        if ctx.claim_url.trim().is_empty() {
            return Err(MailError::InvalidTemplateContext(
                "claim_url is empty".to_string(),
            ));
        }
        if ctx.entity.trim().is_empty() {
            return Err(MailError::InvalidTemplateContext(
                "entity is empty".to_string(),
            ));
        }

        let body = self.render(&ctx.template_name(), ctx)?;
        let subject = self
            .env
            .render_str(SUBJECT_TEMPLATE, ctx)
            .map_err(|e| MailError::TemplateRenderError(format!("subject: {e}")))?;

        Ok(RenderedInvitation { subject, body })
    }

    fn list_templates(&self) -> Result<Vec<String>> {
        let Some(dir) = &self.templates_dir else {
            let mut names: Vec<String> = BUILTIN_TEMPLATES
                .iter()
                .filter_map(|(name, _)| name.strip_suffix(".j2"))
                .map(str::to_string)
                .collect();
            names.sort();
            return Ok(names);
        };

        let entries = std::fs::read_dir(dir).map_err(|source| MailError::TemplateListError {
            path: dir.clone(),
            source,
        })?;

        let mut templates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| MailError::TemplateListError {
                path: dir.clone(),
                source,
            })?;

            let path = entry.path();
            if path.is_file()
                && let Some(ext) = path.extension()
                && ext == "j2"
                && let Some(name) = path.file_stem()
                && let Some(name_str) = name.to_str()
            {
                templates.push(name_str.to_string());
            }
        }

        templates.sort();
        Ok(templates)
    }
}

fn name_with_ext(name: &str) -> String {
    format!("{name}.j2")
}
