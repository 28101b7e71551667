//! Target table provisioning
//!
//! Derives a `CreateTableRequest` for the target from the source table's
//! description, creates the table and waits for it to become ACTIVE.
//!
//! A plain copy carries the key schema, attribute definitions, billing
//! mode and any positive provisioned capacity. A verbose copy also carries
//! the stream specification, secondary indexes, encryption settings and
//! every source tag, plus a `Source_Table` tag holding the source ARN.

use crate::config::WaiterConfig;
use crate::waiter::wait_until_active;
use tablecopy_core::{
    CreateTableRequest, ProvisionedThroughput, Result, SecondaryIndex, SseSpecification,
    TableDescription, TableProvisioner, Tag, TagLister,
};
use tracing::{debug, info};

/// Tag added to a verbose copy naming the source table ARN
pub const SOURCE_TABLE_TAG: &str = "Source_Table";

/// `None` when neither capacity is positive; otherwise copied as-is
fn positive_throughput(throughput: &ProvisionedThroughput) -> Option<ProvisionedThroughput> {
    if throughput.is_unset() {
        None
    } else {
        Some(*throughput)
    }
}

fn copy_index(index: &SecondaryIndex) -> SecondaryIndex {
    SecondaryIndex {
        provisioned_throughput: index
            .provisioned_throughput
            .as_ref()
            .and_then(positive_throughput),
        ..index.clone()
    }
}

/// All tags on `arn`, following pagination to the end
pub fn collect_tags<T: TagLister + ?Sized>(lister: &T, arn: &str) -> Result<Vec<Tag>> {
    let mut tags = Vec::new();
    let mut next_token: Option<String> = None;
    loop {
        let page = lister.list_tags(arn, next_token.as_deref())?;
        tags.extend(page.tags);
        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }
    Ok(tags)
}

/// Build the create request for `target` from the source description
pub fn build_create_request<T: TagLister + ?Sized>(
    lister: &T,
    source: &TableDescription,
    target: &str,
    verbose: bool,
) -> Result<CreateTableRequest> {
    let mut request = CreateTableRequest::new(
        target,
        source.key_schema.clone(),
        source.attribute_definitions.clone(),
    )
    .with_billing_mode(source.billing_mode.unwrap_or_default());
    request.provisioned_throughput = positive_throughput(&source.provisioned_throughput);

    if verbose {
        request.stream_specification = source.stream_specification.clone();
        request.global_secondary_indexes =
            source.global_secondary_indexes.iter().map(copy_index).collect();
        request.local_secondary_indexes =
            source.local_secondary_indexes.iter().map(copy_index).collect();
        request.sse_specification = source.sse_description.as_ref().map(SseSpecification::from);

        let mut tags = collect_tags(lister, &source.table_arn)?;
        tags.push(Tag::new(SOURCE_TABLE_TAG, source.table_arn.clone()));
        request.tags = tags;
    }
    Ok(request)
}

/// Create `target` modelled on `source` and wait until it is ACTIVE
pub fn provision_target<B: TableProvisioner + TagLister + ?Sized>(
    backend: &B,
    source: &TableDescription,
    target: &str,
    verbose: bool,
    waiter: &WaiterConfig,
) -> Result<TableDescription> {
    let request = build_create_request(backend, source, target, verbose)?;
    info!(
        table = target,
        billing_mode = ?request.billing_mode,
        verbose,
        tags = request.tags.len(),
        "creating target table"
    );
    backend.create_table(request)?;
    debug!(table = target, "waiting for target table to become active");
    wait_until_active(backend, target, waiter)
}
