use crate::cmd::step;
use crate::cmd::Workspace;
use crate::output::print_json;
use anyhow::bail;
use clap::Subcommand;
use devforge_core::settings::{AiProvider, RepoSource, Settings};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum SettingsSubcommand {
    /// Show global settings, or one project's
    Show {
        #[arg(long)]
        project: Option<String>,
    },
    /// Change global settings, or one project's
    Set {
        #[arg(long)]
        project: Option<String>,
        /// AI provider (openai, anthropic)
        #[arg(long)]
        provider: Option<AiProvider>,
        /// Model name; resets to the provider default when the provider changes
        #[arg(long)]
        model: Option<String>,
        /// Connect a GitHub repository (owner/name) for scanning
        #[arg(long, conflicts_with = "local")]
        github: Option<String>,
        /// Connect a local directory for scanning
        #[arg(long)]
        local: Option<PathBuf>,
        /// Disconnect the repository source
        #[arg(long, conflicts_with_all = ["github", "local"])]
        disconnect: bool,
    },
}

pub fn run(root: &Path, subcmd: SettingsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SettingsSubcommand::Show { project } => {
            let ws = Workspace::open(root)?;
            let settings = match project {
                Some(id) => ws.load(&id)?.settings,
                None => global(&ws),
            };
            emit(&settings, json)
        }
        SettingsSubcommand::Set {
            project,
            provider,
            model,
            github,
            local,
            disconnect,
        } => {
            let change = Change {
                provider,
                model,
                source: match (github, local) {
                    (Some(full_name), _) => Some(Some(RepoSource::Github { full_name })),
                    (None, Some(path)) => Some(Some(RepoSource::Local { path })),
                    (None, None) if disconnect => Some(None),
                    (None, None) => None,
                },
            };
            match project {
                Some(id) => step::apply(root, &id, json, |p| {
                    Ok(p.with_settings(change.apply(p.settings.clone())))
                }),
                None => {
                    let ws = Workspace::open(root)?;
                    let next = change.apply(global(&ws));
                    if !ws.store.save_settings(&next) {
                        bail!("failed to save settings");
                    }
                    emit(&next, json)
                }
            }
        }
    }
}

fn global(ws: &Workspace) -> Settings {
    ws.store
        .load_settings()
        .unwrap_or_else(|| ws.config.default_settings())
}

struct Change {
    provider: Option<AiProvider>,
    model: Option<String>,
    /// `Some(None)` clears the source.
    source: Option<Option<RepoSource>>,
}

impl Change {
    fn apply(self, current: Settings) -> Settings {
        let mut next = match self.provider {
            Some(provider) if provider != current.ai_provider => {
                current.with_provider(provider, self.model)
            }
            _ => {
                let mut s = current;
                if let Some(model) = self.model {
                    s.model = model;
                }
                s
            }
        };
        if let Some(source) = self.source {
            next.repo_source = source;
        }
        next
    }
}

fn emit(settings: &Settings, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(settings);
    }
    println!("provider:    {}", settings.ai_provider);
    println!("model:       {}", settings.effective_model());
    match &settings.repo_source {
        Some(RepoSource::Github { full_name }) => println!("repository:  github {full_name}"),
        Some(RepoSource::Local { path }) => println!("repository:  local {}", path.display()),
        None => println!("repository:  (none)"),
    }
    for preset in &settings.rule_presets {
        println!("preset:      {}", preset.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change() -> Change {
        Change {
            provider: None,
            model: None,
            source: None,
        }
    }

    #[test]
    fn provider_switch_resets_model_unless_given() {
        let next = Change {
            provider: Some(AiProvider::Anthropic),
            ..change()
        }
        .apply(Settings::default());
        assert_eq!(next.model, AiProvider::Anthropic.default_model());
    }

    #[test]
    fn model_alone_keeps_provider() {
        let next = Change {
            model: Some("gpt-4o-mini".into()),
            ..change()
        }
        .apply(Settings::default());
        assert_eq!(next.ai_provider, AiProvider::OpenAi);
        assert_eq!(next.model, "gpt-4o-mini");
    }

    #[test]
    fn disconnect_clears_source() {
        let mut current = Settings::default();
        current.repo_source = Some(RepoSource::Github {
            full_name: "octo/app".into(),
        });
        let next = Change {
            source: Some(None),
            ..change()
        }
        .apply(current);
        assert!(next.repo_source.is_none());
    }
}
