//! CLI runner - executes commands

use crate::api::{self, VkApi};
use crate::cli::commands::{Cli, Commands};
use crate::config::Config;
use crate::engine::Harvester;
use crate::error::{Error, Result};
use crate::filter::{parse_cutoff, public_groups, KeywordMatcher, UserIdSet};
use crate::output::{OutComment, OutFriend, OutGroup, OutKeyword, OutLike, SheetRow, SheetWriter};
use crate::pagination::{DateCutoff, FetchBudget};
use crate::types::{Group, Post};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What the `groups` command looks for in each post
#[derive(Debug, Clone, Copy)]
struct GroupScan {
    likes: bool,
    comments: bool,
    cutoff: Option<DateCutoff>,
}

/// Rows found by the `groups` command
#[derive(Debug, Default)]
struct GroupMatches {
    likes: Vec<OutLike>,
    comments: Vec<OutComment>,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        if self.cli.extract_config {
            Config::write_template(&self.cli.config)?;
            info!(
                "Config template written to {}, fill it in and run again",
                self.cli.config.display()
            );
            return Ok(());
        }

        let command = self
            .cli
            .command
            .as_ref()
            .ok_or_else(|| Error::config("No command given (see --help)"))?;

        let config = Config::load(&self.cli.config)?;
        let api = api::connect(&config)?;
        let profile = api.verify().await?;
        info!("Signed in as {} {}", profile.first_name, profile.last_name);

        let started = Instant::now();
        let mut harvester = Harvester::new(&api, config.fetch_config());

        match command {
            Commands::Friends => self.friends(&config, &mut harvester).await?,
            Commands::Groups {
                date,
                likes,
                no_comments,
            } => {
                let scan = GroupScan {
                    likes: *likes,
                    comments: !*no_comments,
                    cutoff: date.as_deref().map(parse_cutoff).transpose()?,
                };
                self.groups(&config, &mut harvester, scan).await?;
            }
            Commands::Keywords { comments } => {
                self.keywords(&config, &mut harvester, *comments).await?;
            }
            Commands::Search { query } => self.search(&mut harvester, query).await?,
        }

        let stats = harvester.stats();
        info!(
            "Done in {:.1}s: {} requests, {} records, {} errors",
            started.elapsed().as_secs_f64(),
            stats.round_trips(),
            stats.records_fetched,
            stats.errors
        );
        Ok(())
    }

    fn budget(&self) -> FetchBudget {
        self.cli.budget()
    }

    fn writer(&self) -> SheetWriter {
        SheetWriter::new(&self.cli.output)
    }

    fn save<T: SheetRow>(&self, rows: &[T]) -> Result<()> {
        let (path, count) = self.writer().write(rows)?;
        info!("Saved {count} rows to {}", path.display());
        Ok(())
    }

    /// Export the friend list of `friends.user_id`
    async fn friends(&self, config: &Config, harvester: &mut Harvester<'_, VkApi>) -> Result<()> {
        let user_id = config
            .friends
            .user_id
            .ok_or_else(|| Error::missing_field("friends.user_id"))?;

        let friends = harvester.friends(user_id, self.budget()).await?;
        info!("User {user_id} has {} friends", friends.len());

        let rows: Vec<OutFriend> = friends.records().iter().map(OutFriend::from).collect();
        self.save(&rows)
    }

    /// Search communities by name
    async fn search(&self, harvester: &mut Harvester<'_, VkApi>, query: &str) -> Result<()> {
        let groups = harvester.search_groups(query, self.budget()).await?;
        info!("Found {} groups for '{query}'", groups.len());

        let rows: Vec<OutGroup> = groups.records().iter().map(OutGroup::from).collect();
        self.save(&rows)
    }

    /// Look for likes and comments of the configured users
    async fn groups(
        &self,
        config: &Config,
        harvester: &mut Harvester<'_, VkApi>,
        scan: GroupScan,
    ) -> Result<()> {
        if !scan.likes && !scan.comments {
            warn!("Nothing to look for: pass --likes or drop --no-comments");
            return Ok(());
        }

        let mut found = GroupMatches::default();

        if config.groups.from_user {
            let users = harvester.users_by_id(&config.groups.user_ids).await?;
            for user in users.into_records() {
                info!("User {} ({})", user.full_name(), user.id);
                let targets = UserIdSet::new([user.id]);
                harvester.pause().await;
                let groups = harvester.user_groups(user.id, self.budget()).await?;
                for group in public_groups(groups.into_records()) {
                    harvester.pause().await;
                    self.scan_group(harvester, &group, &targets, scan, &mut found)
                        .await?;
                }
            }
        } else {
            let targets = UserIdSet::new(config.groups.user_ids.iter().copied());
            if targets.is_empty() {
                return Err(Error::missing_field("groups.user_ids"));
            }
            let groups = harvester.groups_by_id(&config.groups.group_ids).await?;
            for group in public_groups(groups.into_records()) {
                harvester.pause().await;
                self.scan_group(harvester, &group, &targets, scan, &mut found)
                    .await?;
            }
        }

        if scan.likes {
            self.save(&found.likes)?;
        }
        if scan.comments {
            self.save(&found.comments)?;
        }
        Ok(())
    }

    /// Collect matches from the wall of one group
    async fn scan_group(
        &self,
        harvester: &mut Harvester<'_, VkApi>,
        group: &Group,
        targets: &UserIdSet,
        scan: GroupScan,
        found: &mut GroupMatches,
    ) -> Result<()> {
        let posts = self.recent_posts(harvester, group, scan.cutoff).await?;
        info!("Group {} ({}): {} posts", group.name, group.id, posts.len());

        for post in &posts {
            if scan.likes && post.likes > 0 {
                harvester.pause().await;
                let likers = harvester.likes(group.id, post.id, self.budget()).await?;
                for user in likers.records().iter().filter(|u| targets.contains(u.id)) {
                    info!("Like: user {} post {}_{}", user.id, group.id, post.id);
                    found.likes.push(OutLike::new(user.id, group, post));
                }
            }

            if scan.comments && post.comments > 0 {
                harvester.pause().await;
                let comments = harvester
                    .comments_with_threads(group.id, post.id, self.budget())
                    .await?;
                for comment in comments
                    .records()
                    .iter()
                    .filter(|c| targets.contains(c.from_id))
                {
                    info!(
                        "Comment: user {} post {}_{} comment {}",
                        comment.from_id, group.id, post.id, comment.id
                    );
                    found
                        .comments
                        .push(OutComment::new(comment.from_id, group, post, comment));
                }
            }
        }
        Ok(())
    }

    /// Look for the configured keywords in posts and, optionally, comments
    async fn keywords(
        &self,
        config: &Config,
        harvester: &mut Harvester<'_, VkApi>,
        with_comments: bool,
    ) -> Result<()> {
        let matcher = KeywordMatcher::new(&config.keywords.keywords)?;
        if matcher.is_empty() {
            return Err(Error::missing_field("keywords.keywords"));
        }

        let groups = harvester.groups_by_id(&config.keywords.group_ids).await?;
        let mut rows = Vec::new();

        for group in public_groups(groups.into_records()) {
            harvester.pause().await;
            let posts = self.recent_posts(harvester, &group, None).await?;
            info!("Group {} ({}): {} posts", group.name, group.id, posts.len());

            for post in &posts {
                if let Some(keyword) = matcher.first_match(&post.text) {
                    debug!("'{keyword}' in post {}_{}", group.id, post.id);
                    rows.push(OutKeyword(OutComment::post_hit(&group, post)));
                }

                if with_comments && post.comments > 0 {
                    harvester.pause().await;
                    let comments = harvester
                        .comments_with_threads(group.id, post.id, self.budget())
                        .await?;
                    for comment in comments.records() {
                        if let Some(keyword) = matcher.first_match(&comment.text) {
                            debug!(
                                "'{keyword}' in comment {} of post {}_{}",
                                comment.id, group.id, post.id
                            );
                            rows.push(OutKeyword(OutComment::comment_hit(&group, post, comment)));
                        }
                    }
                }
            }
        }

        info!("{} keyword hits", rows.len());
        self.save(&rows)
    }

    /// Wall posts of `group`, dropping those older than the cutoff
    async fn recent_posts(
        &self,
        harvester: &mut Harvester<'_, VkApi>,
        group: &Group,
        cutoff: Option<DateCutoff>,
    ) -> Result<Vec<Post>> {
        let posts = harvester
            .wall_posts(group.id, self.budget(), cutoff)
            .await?
            .into_records();
        Ok(match cutoff {
            Some(cutoff) => posts.into_iter().filter(|p| cutoff.admits(p)).collect(),
            None => posts,
        })
    }
}
