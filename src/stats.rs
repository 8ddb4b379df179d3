/// Counters collected over one ingestion run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub rows_read: u64,
    pub rows_dropped: u64,
    pub records_extracted: u64,
    pub unique_records: u64,
    pub duplicates_discarded: u64,
    pub batches_written: u64,
    pub rows_inserted: u64,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows the store skipped even though they were sent
    pub fn rows_ignored(&self) -> u64 {
        self.unique_records.saturating_sub(self.rows_inserted)
    }

    pub fn print_summary(&self) {
        println!("Rows read:          {}", self.rows_read);
        println!("Rows dropped:       {}", self.rows_dropped);
        println!("Records extracted:  {}", self.records_extracted);
        println!("Duplicates skipped: {}", self.duplicates_discarded);
        println!("Unique records:     {}", self.unique_records);
        println!("Batches written:    {}", self.batches_written);
        println!("Rows inserted:      {}", self.rows_inserted);
        if self.rows_ignored() > 0 {
            println!("Rows ignored:       {}", self.rows_ignored());
        }
    }
}

/// Outcome of a CRM push
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushStats {
    pub attempted: u64,
    pub created: u64,
    pub failed: u64,
}

impl PushStats {
    pub fn print_summary(&self) {
        println!("Contacts attempted: {}", self.attempted);
        println!("Contacts created:   {}", self.created);
        println!("Contacts failed:    {}", self.failed);
    }
}
