//! Layer/cluster assignments and the cluster table.

use rusqlite::{OptionalExtension, params};
use strata_core::{Assignment, BatchRecord, ClusterId, Plan, SymbolId};

use crate::{Result, Store};

impl Store {
    /// Replace every stored assignment and cluster with `plan`'s. Prior results
    /// are discarded unconditionally; a failure leaves them untouched.
    pub fn replace_plan(&self, plan: &Plan) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM assignments", [])?;
        tx.execute("DELETE FROM clusters", [])?;
        {
            let mut assign =
                tx.prepare("INSERT INTO assignments (symbol_id, layer, cluster_id) VALUES (?1, ?2, ?3)")?;
            for a in plan.assignments() {
                assign.execute(params![a.symbol_id.0, a.layer, a.cluster_id.0])?;
            }

            let mut cluster = tx.prepare(
                "INSERT INTO clusters (cluster_id, cluster_type, layer, member_ids, estimated_cost)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for c in &plan.clusters {
                let members = serde_json::to_string(&c.members)?;
                cluster.execute(params![c.id.0, c.cluster_type, c.layer, members, c.estimated_cost as i64])?;
            }
        }
        tx.commit()?;
        tracing::info!(
            "Stored {} clusters over {} layers",
            plan.clusters.len(),
            plan.layering.len()
        );
        Ok(())
    }

    /// Stored clusters in batch order: layer, then cluster id.
    pub fn load_batches(&self) -> Result<Vec<BatchRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT cluster_id, cluster_type, layer, member_ids, estimated_cost
             FROM clusters ORDER BY layer, cluster_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, batch_type, layer, members, cost)| -> Result<BatchRecord> {
                Ok(BatchRecord {
                    batch_id: ClusterId(id),
                    batch_type,
                    layer,
                    member_ids: serde_json::from_str(&members)?,
                    estimated_cost: cost as u64,
                })
            })
            .collect()
    }

    pub fn assignment(&self, id: SymbolId) -> Result<Option<Assignment>> {
        let row = self
            .conn
            .query_row(
                "SELECT symbol_id, layer, cluster_id FROM assignments WHERE symbol_id = ?1",
                params![id.0],
                |row| {
                    Ok(Assignment {
                        symbol_id: SymbolId(row.get(0)?),
                        layer: row.get(1)?,
                        cluster_id: ClusterId(row.get(2)?),
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}
