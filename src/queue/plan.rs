//! Split an asset queue into combinable runs.
//!
//! Walking the queue in order, each asset is either concat-able (a static
//! file under the document root on this site) or not. Concat-able assets
//! with the same media accumulate into one run; anything else closes the
//! current run and is emitted on its own, so page order is never changed.

use super::{AssetEntry, AssetQueue};
use crate::concat::ReferenceEncoder;
use crate::debug;
use percent_encoding::percent_decode_str;
use std::path::{Component, Path};
use url::Url;

/// Which asset family a plan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AssetKind {
    Css,
    Js,
}

impl AssetKind {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Css => ".css",
            Self::Js => ".js",
        }
    }
}

/// Veto or force the concat decision for a handle.
pub type ConcatFilter<'a> = &'a dyn Fn(&str, bool) -> bool;

/// Everything the planner needs besides the queue itself.
pub struct PlanContext<'a> {
    /// Document root; concat-able files must canonicalize inside it.
    pub root: &'a Path,
    /// Host of the site URL. `None` treats every absolute URL as external.
    pub site_host: Option<&'a str>,
    /// Right-to-left page: stylesheets with an RTL variant stay separate.
    pub rtl: bool,
    /// Plan footer scripts instead of header scripts.
    pub footer: bool,
    pub filter: Option<ConcatFilter<'a>>,
}

/// One step of page output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// Run of concat-able assets sharing one media.
    Combined {
        media: String,
        paths: Vec<String>,
        handles: Vec<String>,
    },
    /// Asset loaded from its own URL.
    Single {
        handle: String,
        media: String,
        src: String,
    },
}

/// A planned URL ready to be placed in markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedUrl {
    pub media: String,
    pub url: String,
    pub handles: Vec<String>,
}

/// Plan pending assets of `kind`, marking each planned handle done.
pub fn plan(queue: &mut dyn AssetQueue, ctx: &PlanContext<'_>, kind: AssetKind) -> Vec<Emission> {
    let mut emissions = Vec::new();
    let mut run: Option<(String, Vec<String>, Vec<String>)> = None;

    for handle in queue.pending() {
        let Some(entry) = queue.entry(&handle).cloned() else {
            continue;
        };

        if kind == AssetKind::Js && entry.footer != ctx.footer {
            continue;
        }

        // Grouping handles carry no source of their own.
        if entry.src.is_empty() {
            queue.mark_done(&handle);
            continue;
        }

        let media = match kind {
            AssetKind::Css => entry.media.clone().unwrap_or_else(|| "all".to_string()),
            AssetKind::Js => "all".to_string(),
        };

        let local = concat_path(&entry, ctx, kind);
        let mut do_concat = local.is_some();
        if let Some(filter) = ctx.filter {
            do_concat = filter(&handle, do_concat);
        }

        match local.filter(|_| do_concat) {
            Some(path) => {
                let media_changed = run.as_ref().is_some_and(|(m, _, _)| *m != media);
                if media_changed && let Some(closed) = run.take() {
                    emissions.push(close_run(closed));
                }
                let (_, paths, handles) =
                    run.get_or_insert_with(|| (media.clone(), Vec::new(), Vec::new()));
                paths.push(path);
                handles.push(handle.clone());
            }
            None => {
                if let Some(closed) = run.take() {
                    emissions.push(close_run(closed));
                }
                debug!("plan"; "{} not combinable", handle);
                emissions.push(Emission::Single {
                    handle: handle.clone(),
                    media,
                    src: entry.src.clone(),
                });
            }
        }

        queue.mark_done(&handle);
    }

    if let Some(closed) = run.take() {
        emissions.push(close_run(closed));
    }
    emissions
}

/// Turn a plan into URLs.
///
/// Runs of several files become one combined URL, falling back to one URL
/// per file when the combined URL cannot be built. Singles keep their
/// source, cache-busted when it is local.
pub fn render(emissions: &[Emission], encoder: &ReferenceEncoder<'_>) -> Vec<RenderedUrl> {
    let mut out = Vec::new();
    for emission in emissions {
        match emission {
            Emission::Combined {
                media,
                paths,
                handles,
            } => {
                let urls = encoder.group_urls(paths);
                if urls.len() == 1 {
                    out.extend(urls.into_iter().map(|url| RenderedUrl {
                        media: media.clone(),
                        url,
                        handles: handles.clone(),
                    }));
                } else {
                    out.extend(urls.into_iter().zip(handles).map(|(url, handle)| RenderedUrl {
                        media: media.clone(),
                        url,
                        handles: vec![handle.clone()],
                    }));
                }
            }
            Emission::Single { handle, media, src } => out.push(RenderedUrl {
                media: media.clone(),
                url: encoder.cache_bust(src),
                handles: vec![handle.clone()],
            }),
        }
    }
    out
}

fn close_run((media, paths, handles): (String, Vec<String>, Vec<String>)) -> Emission {
    Emission::Combined {
        media,
        paths,
        handles,
    }
}

/// Root-relative path of a concat-able asset, or `None`.
fn concat_path(entry: &AssetEntry, ctx: &PlanContext<'_>, kind: AssetKind) -> Option<String> {
    if entry.conditional.is_some() {
        return None;
    }
    if kind == AssetKind::Css && ctx.rtl && entry.rtl {
        return None;
    }

    let path = local_source_path(&entry.src, ctx.site_host)?;
    if !path.contains(kind.extension()) {
        return None;
    }

    let root = ctx.root.canonicalize().ok()?;
    let file = root.join(path.trim_start_matches('/')).canonicalize().ok()?;
    if !file.is_file() {
        return None;
    }
    let rel = file.strip_prefix(&root).ok()?;

    let mut out = String::new();
    for component in rel.components() {
        let Component::Normal(part) = component else {
            return None;
        };
        out.push('/');
        out.push_str(part.to_str()?);
    }
    // List and version separators of the combined URL
    if out.contains([',', '?']) {
        return None;
    }
    Some(out)
}

/// URL path of `src` when it is served by this site.
fn local_source_path(src: &str, site_host: Option<&str>) -> Option<String> {
    let path = if src.starts_with("//") || src.contains("://") {
        let absolute = if src.starts_with("//") {
            format!("http:{src}")
        } else {
            src.to_string()
        };
        let url = Url::parse(&absolute).ok()?;
        if url.host_str().is_none() || url.host_str() != site_host {
            return None;
        }
        url.path().to_string()
    } else {
        let path = src.split(['?', '#']).next()?;
        if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        }
    };

    percent_decode_str(&path)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}
